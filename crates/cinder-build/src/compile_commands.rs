//! compile_commands.json support.
//!
//! Editors and clang tooling read this file to learn how each unit is
//! compiled. cinder writes one entry per compilation unit it plans.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{BuildError, Result};

/// A single compile command from compile_commands.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: PathBuf,

    /// The source file path.
    pub file: PathBuf,

    /// The full compilation command (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// The compilation arguments (array form).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,

    /// Output file (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Create an entry in argument-array form.
    pub fn new(
        directory: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
        arguments: Vec<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            directory: directory.into(),
            file: file.into(),
            command: None,
            arguments: Some(arguments),
            output: Some(output.into()),
        }
    }
}

/// Collection of compile commands (compile_commands.json).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl CompileCommands {
    /// Default file name, placed in the project directory.
    pub const FILE_NAME: &'static str = "compile_commands.json";

    pub fn new(commands: Vec<CompileCommand>) -> Self {
        Self { commands }
    }

    /// Load compile commands from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Parse compile commands from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let commands: Vec<CompileCommand> = serde_json::from_str(json)?;
        Ok(Self { commands })
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.commands)?)
    }

    /// Write the database to `path`.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json + "\n").map_err(|e| BuildError::io(path, e))
    }

    /// Get all compile commands.
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// Replace the entries `fresh` has for the same file and directory and
    /// append the rest. Entries for files cinder does not build stay.
    pub fn update(&mut self, fresh: CompileCommands) {
        for command in fresh.commands {
            let existing = self
                .commands
                .iter()
                .position(|c| c.file == command.file && c.directory == command.directory);
            match existing {
                Some(i) => self.commands[i] = command,
                None => self.commands.push(command),
            }
        }
    }
}
