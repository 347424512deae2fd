use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use portable_pty::{
    native_pty_system, Child as PtyChild, ChildKiller, CommandBuilder, MasterPty, PtySize,
};

use crate::error::{Error, Result};
use crate::output::{OutputStream, StreamKind};
use crate::shell::{Backend, PtyLauncher, Shell};

/// Exit information of a finished child.
pub(crate) struct ProcessState {
    pub success: bool,
    pub description: String,
}

enum ChildHandle {
    Direct(std::process::Child),
    Pty {
        child: Box<dyn PtyChild + Send + Sync>,
        // The master side has to outlive the reader cloned from it.
        _master: Box<dyn MasterPty + Send>,
    },
}

/// A started child together with the streams its output arrives on.
pub(crate) struct SpawnedProcess {
    pub pid: u32,
    pub streams: Vec<OutputStream>,
    child: ChildHandle,
}

impl SpawnedProcess {
    /// Reaps the child if it has exited, without blocking.
    pub fn try_wait(&mut self) -> io::Result<Option<ProcessState>> {
        match &mut self.child {
            ChildHandle::Direct(child) => Ok(child.try_wait()?.map(|status| ProcessState {
                success: status.success(),
                description: status.to_string(),
            })),
            ChildHandle::Pty { child, .. } => Ok(child.try_wait()?.map(|status| ProcessState {
                success: status.success(),
                description: format!("exit status: {}", status.exit_code()),
            })),
        }
    }
}

pub(crate) fn spawn(
    backend: &Backend,
    command: &str,
    dir: &Path,
    pty_size: PtySize,
) -> Result<SpawnedProcess> {
    match backend {
        Backend::Direct { shell, path } => spawn_direct(*shell, path, command, dir),
        Backend::Pty(launcher) => spawn_pty(launcher, command, dir, pty_size),
    }
}

fn spawn_direct(shell: Shell, path: &Path, command: &str, dir: &Path) -> Result<SpawnedProcess> {
    let mut cmd = Command::new(path);
    cmd.arg(shell.command_flag())
        .arg(command)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    prepare_process_group(&mut cmd);

    let mut child = cmd.spawn().map_err(Error::Spawn)?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(Error::Spawn(io::Error::other("child output was not captured")));
    };

    Ok(SpawnedProcess {
        pid: child.id(),
        streams: vec![
            OutputStream::new(StreamKind::Stderr, stderr),
            OutputStream::new(StreamKind::Stdout, stdout),
        ],
        child: ChildHandle::Direct(child),
    })
}

fn spawn_pty(
    launcher: &PtyLauncher,
    command: &str,
    dir: &Path,
    pty_size: PtySize,
) -> Result<SpawnedProcess> {
    let pair = native_pty_system().openpty(pty_size).map_err(Error::pty)?;

    let mut builder = CommandBuilder::new(&launcher.program);
    builder.args(&launcher.args);
    builder.arg(command);
    builder.cwd(dir);

    let mut child = pair.slave.spawn_command(builder).map_err(Error::pty)?;
    // Only the child may hold the slave, or the reader never sees the end of output.
    drop(pair.slave);

    let reader = match pair.master.try_clone_reader() {
        Ok(reader) => reader,
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::pty(e));
        }
    };

    let Some(pid) = child.process_id() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(Error::pty("child has no process id"));
    };

    Ok(SpawnedProcess {
        pid,
        streams: vec![OutputStream {
            kind: StreamKind::Combined,
            reader,
        }],
        child: ChildHandle::Pty {
            child,
            _master: pair.master,
        },
    })
}

#[cfg(unix)]
fn prepare_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(windows)]
fn prepare_process_group(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn prepare_process_group(_command: &mut Command) {}
