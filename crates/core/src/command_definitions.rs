use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config;

/// One entry of a YAML command file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    pub command: String,
    pub shell: Option<String>,
    pub working_directory: Option<String>,
    pub title: Option<String>,
}

/// A command as the dashboard runs it: text, back-end and directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub shell: String,
    pub working_directory: PathBuf,
    pub title: Option<String>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, shell: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        Self {
            command: command.into(),
            shell: shell.into(),
            working_directory: dir.as_ref().to_path_buf(),
            title: None,
        }
    }

    /// Builds a spec from a command file entry, falling back to the
    /// command line defaults for anything the entry leaves out.
    pub fn from_command_definition(
        definition: &CommandDefinition,
        default_shell: &str,
        default_dir: &Path,
    ) -> Self {
        let working_directory = config::expand_working_directory(&definition.working_directory)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_dir.to_path_buf());

        Self {
            command: definition.command.clone(),
            shell: definition
                .shell
                .clone()
                .unwrap_or_else(|| default_shell.to_string()),
            working_directory,
            title: definition.title.clone(),
        }
    }

    /// The window title: an explicit title, or the first meaningful line of the command.
    pub fn title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => short_command(&self.command),
        }
    }
}

impl Display for CommandSpec {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.title())
    }
}

/// Returns the first non-blank line of `command` with leading comment
/// markers and trailing line continuations removed.
///
/// If every line is blank the command is returned unchanged.
pub fn short_command(command: &str) -> String {
    command
        .split('\n')
        .map(|line| {
            line.trim_start_matches([' ', '\t', '#'])
                .trim_end_matches([' ', '\t', '\\'])
        })
        .find(|line| !line.is_empty())
        .unwrap_or(command)
        .to_string()
}
