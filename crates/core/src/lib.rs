//! Multi Watch Core Library
//!
//! This crate provides the core functionality for multi-watch, a terminal
//! dashboard that runs several shell commands at once and tiles their live
//! output into a grid of windows.
//!
//! # Key Features
//!
//! - **Command Definitions**: Command line and YAML-based command configurations
//! - **Execution**: Process-group supervision through a shell or a pseudo terminal
//! - **Output**: Line decoding and a single queue of view updates
//! - **Layout**: Pure grid computation with minimum window sizes
//! - **Dashboard**: Layout passes, lazy dispatch and shutdown
//!
//! # Examples
//!
//! Loading command definitions from a configuration file:
//!
//! ```no_run
//! use multi_watch_core::file_handling::get_command_definitions;
//!
//! let commands = get_command_definitions("~/.multi-watch/commands.yml")?;
//! for command in &commands {
//!     println!("Command: {}", command.command);
//! }
//! # Ok::<(), multi_watch_core::error::Error>(())
//! ```

pub mod command_definitions;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod execution;
pub mod file_handling;
pub mod layout;
pub mod output;
pub mod shell;
