//! Command-line argument parsing.
//!
//! This module defines the command-line interface structure using the
//! `clap` crate.

use clap::{Parser, Subcommand};
use multi_watch_core::config::{DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH, DEFAULT_SHELL};
use multi_watch_core::layout::LayoutThresholds;

/// Command-line arguments for the multi-watch dashboard.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use multi_watch_cli::cli_args::Args;
///
/// let args = Args::parse_from(["multi-watch", "-c", "cargo build", "-c", "cargo test"]);
/// assert_eq!(args.cmd.len(), 2);
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(term_width = 0)] // Just to make testing across clap features easier
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    /// A command to run in its own window.
    ///
    /// Repeat the flag to run several commands side by side.
    #[arg(long, short = 'c', action = clap::ArgAction::Append)]
    pub cmd: Vec<String>,

    /// Minimum width of a command window.
    #[arg(long, default_value_t = DEFAULT_MIN_WIDTH)]
    pub minwidth: u16,

    /// Minimum height of a command window.
    #[arg(long, default_value_t = DEFAULT_MIN_HEIGHT)]
    pub minheight: u16,

    /// Shell the commands are run with: bash, sh, zsh or powershell.
    ///
    /// `pty` runs each command attached to a pseudo terminal without a shell.
    #[arg(long, short = 's', default_value = DEFAULT_SHELL)]
    pub shell: String,

    /// Directory the commands are run in.
    ///
    /// If not provided, the current directory is used.
    #[arg(long, short = 'd')]
    pub dir: Option<String>,

    /// Path to a YAML file of additional commands.
    #[arg(long)]
    pub config: Option<String>,

    /// Write log output to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub internal: Option<Internal>,
}

/// Subcommands the dashboard invokes on itself.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Internal {
    /// Run a command line without a shell, replacing this process.
    #[command(hide = true)]
    Exec {
        /// The full command line, split with shell-like quoting rules.
        command: String,
    },
}

impl Args {
    pub fn thresholds(&self) -> LayoutThresholds {
        LayoutThresholds {
            min_width: self.minwidth,
            min_height: self.minheight,
        }
    }
}
