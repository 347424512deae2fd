//! Shell and back-end resolution.
//!
//! A command runs either through one of a few recognised shells, found on
//! `PATH`, or inside a pseudo terminal by re-invoking a launcher (normally
//! this executable with its internal `exec` subcommand).

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;

use crate::config::{EXEC_SUBCOMMAND, PTY_BACKEND};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Sh,
    Zsh,
    PowerShell,
}

impl Shell {
    pub fn name(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Sh => "sh",
            Shell::Zsh => "zsh",
            Shell::PowerShell => "powershell",
        }
    }

    /// Arguments placed between the shell binary and the command text.
    pub fn command_flag(self) -> &'static str {
        match self {
            Shell::PowerShell => "-Command",
            Shell::Bash | Shell::Sh | Shell::Zsh => "-c",
        }
    }
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "bash" => Ok(Shell::Bash),
            "sh" => Ok(Shell::Sh),
            "zsh" => Ok(Shell::Zsh),
            "powershell" => Ok(Shell::PowerShell),
            _ => Err(Error::UnsupportedShell(name.to_string())),
        }
    }
}

impl Display for Shell {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Resolves a shell name to the executable that will be run.
///
/// # Errors
///
/// Fails with [`Error::UnsupportedShell`] for names outside the recognised
/// set, and with a not-on-path error when the executable cannot be found.
pub fn resolve(name: &str) -> Result<PathBuf> {
    let shell: Shell = name.parse()?;

    match shell {
        Shell::PowerShell => ["powershell", "pwsh"]
            .iter()
            .find_map(|candidate| which::which(candidate).ok())
            .ok_or(Error::PowerShellNotFound),
        _ => which::which(shell.name()).map_err(|original| Error::ShellNotFound {
            shell: shell.name().to_string(),
            original,
        }),
    }
}

/// The program a pty-backed child is started with, followed by the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyLauncher {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl PtyLauncher {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    /// This executable, invoked with its internal `exec` subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the path of the running executable is unavailable.
    pub fn current_exe() -> Result<Self> {
        let program = std::env::current_exe().map_err(Error::pty)?;
        Ok(Self::new(program, &[EXEC_SUBCOMMAND]))
    }
}

/// How an executor turns command text into a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// `<shell> -c <command>` with separate stdout and stderr pipes.
    Direct { shell: Shell, path: PathBuf },
    /// `<launcher...> <command>` attached to a pseudo terminal.
    Pty(PtyLauncher),
}

impl Backend {
    /// Validates a back-end name and resolves everything needed to start it.
    ///
    /// # Errors
    ///
    /// Returns the resolution error of the named shell.
    pub fn resolve(name: &str) -> Result<Self> {
        if name == PTY_BACKEND {
            return Ok(Backend::Pty(PtyLauncher::current_exe()?));
        }

        let shell: Shell = name.parse()?;
        let path = resolve(name)?;
        debug!("Resolved shell `{}` to `{}`", shell, path.display());

        Ok(Backend::Direct { shell, path })
    }

    pub fn name(&self) -> &str {
        match self {
            Backend::Direct { shell, .. } => shell.name(),
            Backend::Pty(_) => PTY_BACKEND,
        }
    }
}
