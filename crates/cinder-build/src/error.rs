//! Error types for cinder.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for cinder operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Everything that aborts a run.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    /// Failed to read configuration file.
    #[error("failed to read config file {}", .path.display())]
    #[diagnostic(code(cinder::config))]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    #[diagnostic(code(cinder::config))]
    ParseToml(#[from] toml::de::Error),

    /// Failed to parse or write JSON (compile_commands.json).
    #[error("failed to process JSON: {0}")]
    #[diagnostic(code(cinder::compdb))]
    Json(#[from] serde_json::Error),

    /// Configuration validation error.
    #[error("config validation error: {0}")]
    #[diagnostic(code(cinder::config))]
    Validation(String),

    /// A file could not be read, listed, or written.
    #[error("I/O error on {}", .path.display())]
    #[diagnostic(code(cinder::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local include names a file that does not exist.
    #[error("missing header `{}` included from `{}`", .header.display(), .includer.display())]
    #[diagnostic(
        code(cinder::missing_header),
        help("local includes are looked up relative to the project directory")
    )]
    MissingHeader { header: PathBuf, includer: PathBuf },

    /// An explicitly requested target has no root unit.
    #[error("target not found: {name} (no `{}`)", .unit.display())]
    #[diagnostic(code(cinder::target_not_found))]
    TargetNotFound { name: String, unit: PathBuf },

    /// No usable C++ compiler.
    #[error("no C++ compiler found")]
    #[diagnostic(
        code(cinder::no_compiler),
        help("install clang++ or g++, or set CXX / `compiler.cxx` in cinder.toml")
    )]
    CompilerNotFound,

    /// The compiler or linker could not be started.
    #[error("failed to execute `{}`", .program.display())]
    #[diagnostic(code(cinder::spawn))]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compile worker pool could not be created.
    #[error("cannot start {jobs} compile workers: {reason}")]
    #[diagnostic(code(cinder::jobs))]
    WorkerPool { jobs: usize, reason: String },

    /// The compiler exited with a failure status.
    #[error("compilation failed for `{}`:\n{output}", .unit.display())]
    #[diagnostic(code(cinder::compile))]
    CompileFailed { unit: PathBuf, output: String },

    /// The linker exited with a failure status.
    #[error("link failed for `{}`:\n{output}", .executable.display())]
    #[diagnostic(code(cinder::link))]
    LinkFailed { executable: PathBuf, output: String },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
