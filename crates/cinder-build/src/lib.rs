//! Configuration, errors, and compilation database for cinder.
//!
//! This crate provides:
//! - Project configuration format (`cinder.toml`)
//! - The error type shared by every stage of a run
//! - compile_commands.json reading and writing
//!
//! # Example
//!
//! ```toml
//! # cinder.toml
//! [compiler]
//! cxx = "clang++"
//! std = "c++17"
//! cflags = ["-Wall", "-Wextra"]
//! libs = ["pthread"]
//!
//! [layout]
//! source_ext = "cpp"
//!
//! [build]
//! jobs = 4
//! ```

mod compile_commands;
mod config;
mod error;

pub use compile_commands::{CompileCommand, CompileCommands};
pub use config::{BuildConfig, BuildSection, CompilerConfig, ConfigOverrides, LayoutConfig};
pub use error::{BuildError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_config() {
        let toml = r#"
[compiler]
std = "c++17"

[layout]
entry_point = "main"
        "#;

        let config = BuildConfig::from_toml(toml).expect("Failed to parse config");
        assert_eq!(config.compiler.std.as_deref(), Some("c++17"));
        assert_eq!(config.layout.entry_point, "main");
        assert!(config.compiler.cxx.is_none());
    }
}
