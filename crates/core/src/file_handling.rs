//! Loading of YAML command files.
//!
//! A command file is a list of [`CommandDefinition`] entries. Entries are
//! validated once at startup so a broken file never reaches the dashboard.

use std::fs::File;

use crate::command_definitions::CommandDefinition;
use crate::error::{Error, Result};

fn get_reader(file_description: &str, path: &str) -> Result<File> {
    File::open(path)
        .map_err(|e| Error::io_error(file_description.to_string(), path.to_string(), e))
}

fn validate_command_definitions(definitions: &[CommandDefinition]) -> Result<()> {
    for (index, definition) in definitions.iter().enumerate() {
        if definition.command.trim().is_empty() {
            return Err(Error::EmptyCommand { index });
        }
    }

    Ok(())
}

/// Loads and validates command definitions from a YAML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The YAML is malformed or doesn't match the expected structure
/// - The file contains no commands
/// - An entry has blank command text
///
/// # Examples
///
/// ```no_run
/// use multi_watch_core::file_handling::get_command_definitions;
///
/// let commands = get_command_definitions("commands.yml")?;
/// println!("Loaded {} commands", commands.len());
/// # Ok::<(), multi_watch_core::error::Error>(())
/// ```
pub fn get_command_definitions(config_path: &str) -> Result<Vec<CommandDefinition>> {
    let config_reader = get_reader("command", config_path)?;

    let parsed_command_defs: Vec<CommandDefinition> = serde_yaml::from_reader(config_reader)
        .map_err(|e| {
            Error::yaml_error(
                "reading".to_string(),
                "command".to_string(),
                config_path.to_string(),
                e,
            )
        })?;

    if parsed_command_defs.is_empty() {
        return Err(Error::empty_command_definition(config_path.to_string()));
    }

    validate_command_definitions(&parsed_command_defs)?;

    Ok(parsed_command_defs)
}
