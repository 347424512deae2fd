//! The internal `exec` entry point used by the pty back-end.
//!
//! The dashboard starts pty children as `<self> exec <command line>`. The
//! command line is split with shell-like quoting rules, but no shell is
//! involved: the first word is looked up on `PATH` and run directly.

use std::process::{Command, ExitCode};

use log::debug;
use multi_watch_core::error::{Error, Result};

/// Splits a command line into program and arguments.
///
/// # Errors
///
/// Returns [`Error::ExecParse`] for unbalanced quotes or an empty command line.
pub fn split_command_line(command_line: &str) -> Result<Vec<String>> {
    let words = shlex::split(command_line)
        .ok_or_else(|| Error::ExecParse(format!("unbalanced quoting in `{command_line}`")))?;

    if words.is_empty() {
        return Err(Error::ExecParse("empty command line".to_string()));
    }

    Ok(words)
}

/// Replaces the current process with `command_line`.
///
/// Only returns on failure.
///
/// # Errors
///
/// Returns an error if the command line cannot be parsed or the program
/// cannot be executed.
#[cfg(unix)]
pub fn exec_command(command_line: &str) -> Result<ExitCode> {
    use std::os::unix::process::CommandExt;

    let words = split_command_line(command_line)?;
    debug!("exec {words:?}");

    let error = Command::new(&words[0]).args(&words[1..]).exec();
    Err(Error::Spawn(error))
}

/// Runs `command_line` to completion and forwards its exit code.
///
/// # Errors
///
/// Returns an error if the command line cannot be parsed or the program
/// cannot be started.
#[cfg(not(unix))]
pub fn exec_command(command_line: &str) -> Result<ExitCode> {
    let words = split_command_line(command_line)?;
    debug!("exec {words:?}");

    let status = Command::new(&words[0])
        .args(&words[1..])
        .status()
        .map_err(Error::Spawn)?;

    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(
            split_command_line("tail -n 20 app.log").unwrap(),
            vec!["tail", "-n", "20", "app.log"]
        );
    }

    #[test]
    fn test_split_honours_quotes() {
        assert_eq!(
            split_command_line(r#"grep "two words" 'single quoted' esc\ aped"#).unwrap(),
            vec!["grep", "two words", "single quoted", "esc aped"]
        );
    }

    #[test]
    fn test_split_unbalanced_quotes() {
        assert!(matches!(
            split_command_line("echo 'oops"),
            Err(Error::ExecParse(_))
        ));
    }

    #[test]
    fn test_split_empty_command_line() {
        assert!(matches!(split_command_line("   "), Err(Error::ExecParse(_))));
    }
}
