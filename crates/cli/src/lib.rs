//! Multi Watch CLI Library
//!
//! This crate provides the terminal front end of multi-watch: argument
//! parsing, the full-screen rendering surface and the internal `exec`
//! entry point used by pty-backed commands.
//!
//! # Architecture
//!
//! - [`cli_args`]: Command-line argument parsing
//! - [`surface`]: Views, key bindings and the main loop on top of ratatui
//! - [`exec`]: Shell-less execution of a single command line
//!
//! # Examples
//!
//! ```bash
//! # Two commands side by side
//! multi-watch -c "cargo watch -x check" -c "tail -f server.log"
//!
//! # Commands from a file, run through bash in another directory
//! multi-watch --config ~/.multi-watch/commands.yml -s bash -d ~/src/app
//!
//! # Smaller windows, each attached to a pseudo terminal
//! multi-watch --minwidth 30 --minheight 6 -s pty -c "htop" -c "top"
//! ```

pub mod cli_args;
pub mod exec;
pub mod surface;
