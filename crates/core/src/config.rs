//! Defaults and path utilities for multi-watch.
//!
//! This module holds the constants that configure the layout thresholds,
//! the default back-end and the internal `exec` entry point, and provides
//! functions for resolving the command file path and working directories.

use std::path::PathBuf;

use portable_pty::PtySize;

/// Default minimum width of a command window, in cells
pub const DEFAULT_MIN_WIDTH: u16 = 50;
/// Default minimum height of a command window, in cells
pub const DEFAULT_MIN_HEIGHT: u16 = 10;

/// Default shell used when none is given on the command line
pub const DEFAULT_SHELL: &str = "sh";

/// Back-end name that selects pty re-execution instead of a shell
pub const PTY_BACKEND: &str = "pty";

/// Name of the internal subcommand a pty child is launched with
pub const EXEC_SUBCOMMAND: &str = "exec";

/// Text shown full-screen while the terminal cannot fit the grid
pub const TOO_SMALL_NOTICE: &str = "Terminal window is too small";

/// Size of the pseudo terminal handed to pty children.
pub const DEFAULT_PTY_SIZE: PtySize = PtySize {
    rows: 24,
    cols: 80,
    pixel_width: 0,
    pixel_height: 0,
};

/// Resolves the command file path, expanding `~`.
///
/// # Examples
///
/// ```
/// use multi_watch_core::config::get_config_path;
///
/// let path = get_config_path("/path/to/commands.yml");
/// assert_eq!(path, "/path/to/commands.yml");
/// ```
pub fn get_config_path(config_path_arg: &str) -> String {
    shellexpand::tilde(config_path_arg).to_string()
}

/// Resolves the directory commands run in.
///
/// An explicitly given directory has shell variables like `~` expanded.
/// Without one, the working directory of the invoking process is used.
///
/// # Errors
///
/// Returns an error if no directory is given and the current directory
/// cannot be determined.
///
/// # Examples
///
/// ```
/// use multi_watch_core::config::resolve_working_directory;
///
/// let dir = resolve_working_directory(&Some("~/projects".to_string())).unwrap();
/// assert!(!dir.starts_with("~"));
/// ```
pub fn resolve_working_directory(working_directory: &Option<String>) -> std::io::Result<PathBuf> {
    match expand_working_directory(working_directory) {
        Some(expanded) => Ok(PathBuf::from(expanded)),
        None => std::env::current_dir(),
    }
}

/// Expands shell variables in a working directory path.
///
/// Returns None if no working directory is provided.
pub fn expand_working_directory(working_directory: &Option<String>) -> Option<String> {
    working_directory
        .as_ref()
        .map(|working_directory| shellexpand::tilde(working_directory).to_string())
}
