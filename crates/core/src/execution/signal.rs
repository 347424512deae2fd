//! Delivery of signals to a child's whole process group.
//!
//! On Unix every child leads its own process group, so signalling `-pid`
//! reaches everything it spawned. Elsewhere only termination is supported,
//! by asking `taskkill` to end the process tree.

use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Kill,
    Hangup,
}

impl Display for Signal {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Kill => "SIGKILL",
            Signal::Hangup => "SIGHUP",
        })
    }
}

#[cfg(unix)]
impl Signal {
    fn as_raw(self) -> libc::c_int {
        match self {
            Signal::Interrupt => libc::SIGINT,
            Signal::Terminate => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
            Signal::Hangup => libc::SIGHUP,
        }
    }
}

#[cfg(unix)]
pub(crate) fn signal_process_group(pid: u32, signal: Signal) -> Result<()> {
    let pgid = libc::pid_t::try_from(pid).map_err(|_| Error::Signal {
        pid,
        original: std::io::Error::from(std::io::ErrorKind::InvalidInput),
    })?;

    // SAFETY: kill has no memory-safety preconditions
    let ret = unsafe { libc::kill(-pgid, signal.as_raw()) };
    if ret == 0 {
        Ok(())
    } else {
        Err(Error::Signal {
            pid,
            original: std::io::Error::last_os_error(),
        })
    }
}

#[cfg(not(unix))]
pub(crate) fn signal_process_group(pid: u32, signal: Signal) -> Result<()> {
    match signal {
        Signal::Kill | Signal::Terminate => {
            let status = std::process::Command::new("taskkill")
                .args(["/T", "/F", "/PID", &pid.to_string()])
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .map_err(|original| Error::Signal { pid, original })?;

            if status.success() {
                Ok(())
            } else {
                Err(Error::Signal {
                    pid,
                    original: std::io::Error::other(format!("taskkill {status}")),
                })
            }
        }
        other => Err(Error::UnsupportedSignal(other.to_string())),
    }
}
