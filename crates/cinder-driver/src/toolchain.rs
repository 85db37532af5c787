//! C++ compiler wrapper for building object files and executables.
//!
//! The executor only talks to the [`Toolchain`] trait; [`CxxToolchain`] is
//! the implementation that shells out to clang++ or g++.

use cinder_build::{BuildError, CompilerConfig, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// What the build executor needs from a compiler.
///
/// Paths are relative to the project directory. Implementations must be
/// usable from several compile workers at once.
pub trait Toolchain: Sync {
    /// Compile one unit into `object`.
    fn compile(&self, unit: &Path, object: &Path) -> Result<()>;

    /// Link `objects` into `executable`.
    fn link(&self, objects: &[PathBuf], executable: &Path) -> Result<()>;
}

/// clang++/g++ driven toolchain.
#[derive(Debug, Clone)]
pub struct CxxToolchain {
    config: CompilerConfig,
    compiler_path: PathBuf,
    root: PathBuf,
}

impl CxxToolchain {
    /// Create a toolchain for the project in `root`.
    ///
    /// A configured compiler given as a bare name is looked up on `PATH`
    /// when it runs; one given as a path must exist.
    pub fn new(config: &CompilerConfig, root: impl Into<PathBuf>) -> Result<Self> {
        let compiler_path = match &config.cxx {
            Some(path) => {
                let is_bare_name = path.components().count() == 1;
                if !is_bare_name && !path.exists() {
                    return Err(BuildError::CompilerNotFound);
                }
                path.clone()
            }
            None => find_compiler()?,
        };

        Ok(Self {
            config: config.clone(),
            compiler_path,
            root: root.into(),
        })
    }

    /// Get the path to the compiler being used.
    pub fn compiler_path(&self) -> &Path {
        &self.compiler_path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full command line (program first) compiling `unit` to `object`.
    pub fn compile_args(&self, unit: &Path, object: &Path) -> Vec<String> {
        let mut args = vec![self.compiler_path.display().to_string()];

        // C++ standard
        if let Some(std) = &self.config.std {
            args.push(format!("-std={}", std));
        }

        // Optimization level
        args.push(format!("-O{}", self.config.opt_level));

        // Debug info
        if self.config.debug_info {
            args.push("-g".to_string());
        }

        // Preprocessor defines
        for def in &self.config.defines {
            args.push(format!("-D{}", def));
        }

        args.extend(self.config.cflags.iter().cloned());

        // Compile only, don't link
        args.push("-c".to_string());
        args.push(unit.display().to_string());
        args.push("-o".to_string());
        args.push(object.display().to_string());
        args
    }

    /// Full command line (program first) linking `objects` into `executable`.
    pub fn link_args(&self, objects: &[PathBuf], executable: &Path) -> Vec<String> {
        let mut args = vec![self.compiler_path.display().to_string()];
        args.extend(objects.iter().map(|o| o.display().to_string()));

        args.push("-o".to_string());
        args.push(executable.display().to_string());

        // Library search paths
        for lib_path in &self.config.lib_paths {
            args.push(format!("-L{}", lib_path));
        }

        // Libraries
        for lib in &self.config.libs {
            args.push(format!("-l{}", lib));
        }
        args
    }

    /// Run a command line in the project directory.
    ///
    /// Returns whether it succeeded and its combined output.
    fn run(&self, args: &[String]) -> Result<(bool, String)> {
        let (program, rest) = match args.split_first() {
            Some(split) => split,
            None => return Err(BuildError::CompilerNotFound),
        };
        debug!(command = ?args, "running toolchain");

        let output = Command::new(program)
            .args(rest)
            .current_dir(&self.root)
            .output()
            .map_err(|source| BuildError::Spawn {
                program: PathBuf::from(program),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{}{}", stdout, stderr).trim_end().to_string();
        Ok((output.status.success(), combined))
    }
}

impl Toolchain for CxxToolchain {
    fn compile(&self, unit: &Path, object: &Path) -> Result<()> {
        let (ok, output) = self.run(&self.compile_args(unit, object))?;
        if !ok {
            return Err(BuildError::CompileFailed {
                unit: unit.to_path_buf(),
                output,
            });
        }
        if !output.is_empty() {
            warn!(unit = %unit.display(), "{}", output);
        }

        // Verify output exists
        if !self.root.join(object).exists() {
            return Err(BuildError::CompileFailed {
                unit: unit.to_path_buf(),
                output: format!("object file not created: {}", object.display()),
            });
        }
        Ok(())
    }

    fn link(&self, objects: &[PathBuf], executable: &Path) -> Result<()> {
        let (ok, output) = self.run(&self.link_args(objects, executable))?;
        if !ok {
            return Err(BuildError::LinkFailed {
                executable: executable.to_path_buf(),
                output,
            });
        }
        if !output.is_empty() {
            warn!(executable = %executable.display(), "{}", output);
        }
        Ok(())
    }
}

/// Find a C++ compiler on the system.
///
/// Searches for clang++ first, then g++, then c++.
pub fn find_compiler() -> Result<PathBuf> {
    for candidate in ["clang++", "g++", "c++"] {
        if let Ok(output) = Command::new("which").arg(candidate).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }
    }

    Err(BuildError::CompilerNotFound)
}
