//! Project configuration (`cinder.toml` format).
//!
//! Every section and field is optional; a project without a config file
//! builds `*.cpp` files with the detected compiler and its default flags.

use cinder_common::Layout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{BuildError, Result};

/// Root build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Compiler and linker settings.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// File naming rules.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Execution settings.
    #[serde(default)]
    pub build: BuildSection,
}

/// Compiler and linker settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// C++ compiler used for compiling and linking (default: detected).
    #[serde(default)]
    pub cxx: Option<PathBuf>,

    /// C++ standard (e.g., "c++17", "c++20").
    #[serde(default)]
    pub std: Option<String>,

    /// Optimization level (0-3).
    #[serde(default)]
    pub opt_level: u8,

    /// Generate debug info (-g).
    #[serde(default)]
    pub debug_info: bool,

    /// Preprocessor definitions.
    #[serde(default)]
    pub defines: Vec<String>,

    /// Additional compiler flags.
    #[serde(default)]
    pub cflags: Vec<String>,

    /// Libraries to link against.
    #[serde(default)]
    pub libs: Vec<String>,

    /// Library search paths.
    #[serde(default)]
    pub lib_paths: Vec<String>,
}

/// File naming rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Suffix of compilation units.
    #[serde(default = "default_source_ext")]
    pub source_ext: String,

    /// Suffix of object files.
    #[serde(default = "default_object_ext")]
    pub object_ext: String,

    /// Suffix of executables (empty on Unix).
    #[serde(default)]
    pub executable_ext: String,

    /// Function whose definition makes a unit a target.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
}

/// Execution settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Maximum concurrent compiler processes (0 = one per CPU).
    #[serde(default)]
    pub jobs: usize,
}

/// Settings given on the command line. They win over the file and the
/// environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub jobs: Option<usize>,
    pub cxx: Option<PathBuf>,
    pub std: Option<String>,
}

fn default_source_ext() -> String {
    Layout::DEFAULT_SOURCE_EXT.to_string()
}

fn default_object_ext() -> String {
    Layout::DEFAULT_OBJECT_EXT.to_string()
}

fn default_entry_point() -> String {
    "main".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_ext: default_source_ext(),
            object_ext: default_object_ext(),
            executable_ext: String::new(),
            entry_point: default_entry_point(),
        }
    }
}

impl BuildConfig {
    /// Name of the config file looked up in the project directory.
    pub const FILE_NAME: &'static str = "cinder.toml";

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: BuildConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `cinder.toml` from `dir`, or the defaults if there is none.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `CXX` and `CXXFLAGS` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `CXX` and `CXXFLAGS` from an arbitrary variable lookup.
    ///
    /// `CXX` replaces the configured compiler; `CXXFLAGS` is appended to the
    /// configured flags.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(cxx) = lookup("CXX").filter(|v| !v.trim().is_empty()) {
            self.compiler.cxx = Some(PathBuf::from(cxx.trim()));
        }
        if let Some(flags) = lookup("CXXFLAGS") {
            self.compiler
                .cflags
                .extend(flags.split_whitespace().map(str::to_string));
        }
    }

    /// Apply command-line settings and validate the result.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(jobs) = overrides.jobs {
            self.build.jobs = jobs;
        }
        if let Some(cxx) = &overrides.cxx {
            self.compiler.cxx = Some(cxx.clone());
        }
        if let Some(std) = &overrides.std {
            self.compiler.std = Some(std.clone());
        }
        self.validate()
    }

    /// Check the settings that would otherwise produce confusing builds.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.source_ext.is_empty() || layout.object_ext.is_empty() {
            return Err(BuildError::Validation(
                "layout.source_ext and layout.object_ext must not be empty".to_string(),
            ));
        }
        if layout.source_ext == layout.object_ext {
            return Err(BuildError::Validation(format!(
                "source and object suffix are both `{}`",
                layout.source_ext
            )));
        }
        let mut chars = layout.entry_point.chars();
        let is_ident = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !is_ident {
            return Err(BuildError::Validation(format!(
                "entry point `{}` is not an identifier",
                layout.entry_point
            )));
        }
        if self
            .compiler
            .cxx
            .as_ref()
            .is_some_and(|cxx| cxx.as_os_str().is_empty())
        {
            return Err(BuildError::Validation("compiler.cxx must not be empty".to_string()));
        }
        if let Some(std) = &self.compiler.std {
            if std.is_empty() || std.contains(char::is_whitespace) {
                return Err(BuildError::Validation(format!(
                    "`{}` is not a C++ standard name",
                    std
                )));
            }
        }
        if self.compiler.opt_level > 3 {
            return Err(BuildError::Validation(format!(
                "opt_level must be 0-3, got {}",
                self.compiler.opt_level
            )));
        }
        Ok(())
    }

    /// Naming rules for a project rooted at `root`.
    pub fn layout(&self, root: &Path) -> Layout {
        Layout::new(root)
            .with_source_ext(&self.layout.source_ext)
            .with_object_ext(&self.layout.object_ext)
            .with_executable_ext(&self.layout.executable_ext)
    }

    /// Effective number of concurrent compiles.
    pub fn jobs(&self) -> usize {
        match self.build.jobs {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[compiler]
cxx = "clang++"
std = "c++20"
opt_level = 2
defines = ["NDEBUG"]
libs = ["pthread", "m"]

[layout]
source_ext = "cc"

[build]
jobs = 4
        "#;

        let config = BuildConfig::from_toml(toml).unwrap();

        assert_eq!(config.compiler.cxx, Some(PathBuf::from("clang++")));
        assert_eq!(config.compiler.std, Some("c++20".to_string()));
        assert_eq!(config.compiler.opt_level, 2);
        assert_eq!(config.compiler.libs, vec!["pthread", "m"]);
        assert_eq!(config.layout.source_ext, "cc");
        assert_eq!(config.layout.object_ext, "o");
        assert_eq!(config.layout.entry_point, "main");
        assert_eq!(config.jobs(), 4);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = BuildConfig::from_toml("").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert!(config.jobs() >= 1);
    }

    #[test]
    fn test_validation() {
        let same_ext = "[layout]\nsource_ext = \"o\"\n";
        assert!(matches!(
            BuildConfig::from_toml(same_ext),
            Err(BuildError::Validation(_))
        ));

        let bad_entry = "[layout]\nentry_point = \"main()\"\n";
        assert!(matches!(
            BuildConfig::from_toml(bad_entry),
            Err(BuildError::Validation(_))
        ));

        let bad_opt = "[compiler]\nopt_level = 7\n";
        assert!(matches!(
            BuildConfig::from_toml(bad_opt),
            Err(BuildError::Validation(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BuildConfig::from_toml("[compiler]\ncflags = [\"-Wall\"]\n").unwrap();
        config.apply_env_from(|key| match key {
            "CXX" => Some("g++-13".to_string()),
            "CXXFLAGS" => Some("-O2  -pedantic".to_string()),
            _ => None,
        });

        assert_eq!(config.compiler.cxx, Some(PathBuf::from("g++-13")));
        assert_eq!(config.compiler.cflags, vec!["-Wall", "-O2", "-pedantic"]);
    }

    #[test]
    fn test_overrides_win_and_are_validated() {
        let mut config =
            BuildConfig::from_toml("[compiler]\nstd = \"c++14\"\n[build]\njobs = 2\n").unwrap();
        config
            .apply_overrides(&ConfigOverrides {
                jobs: Some(8),
                cxx: Some(PathBuf::from("clang++")),
                std: Some("c++20".to_string()),
            })
            .unwrap();
        assert_eq!(config.jobs(), 8);
        assert_eq!(config.compiler.cxx, Some(PathBuf::from("clang++")));
        assert_eq!(config.compiler.std.as_deref(), Some("c++20"));

        let bad_std = ConfigOverrides {
            std: Some("c++ 20".to_string()),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            config.apply_overrides(&bad_std),
            Err(BuildError::Validation(_))
        ));

        let empty_cxx = ConfigOverrides {
            cxx: Some(PathBuf::new()),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            BuildConfig::default().apply_overrides(&empty_cxx),
            Err(BuildError::Validation(_))
        ));
    }

    #[test]
    fn test_load_missing_and_present() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        assert_eq!(BuildConfig::load(dir.path()).unwrap(), BuildConfig::default());

        std::fs::write(
            dir.path().join(BuildConfig::FILE_NAME),
            "[compiler]\nstd = \"c++17\"\n",
        )
        .unwrap();
        let config = BuildConfig::load(dir.path()).unwrap();
        assert_eq!(config.compiler.std.as_deref(), Some("c++17"));

        std::fs::write(dir.path().join(BuildConfig::FILE_NAME), "[compiler\n").unwrap();
        assert!(matches!(
            BuildConfig::load(dir.path()),
            Err(BuildError::ParseToml(_))
        ));
    }

    #[test]
    fn test_layout_from_config() {
        let config = BuildConfig::from_toml("[layout]\nexecutable_ext = \"exe\"\n").unwrap();
        let layout = config.layout(Path::new("/proj"));
        assert_eq!(layout.root(), Path::new("/proj"));
        assert_eq!(layout.executable_for("main"), Path::new("main.exe"));
    }
}
