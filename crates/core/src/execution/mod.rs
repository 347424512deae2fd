//! Supervision of one command's child process.
//!
//! An [`Executor`] holds everything needed to start its command and, while
//! a run is in flight, the pid of the child. At most one run is in flight
//! per executor; finished executors are immediately reusable.

mod process;
mod signal;

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use portable_pty::PtySize;

pub use signal::Signal;

use crate::config::DEFAULT_PTY_SIZE;
use crate::error::{Error, Result};
use crate::output::{self, OutputSink};
use crate::shell::Backend;

const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// The outcome of one finished run.
#[derive(Debug)]
pub struct ExecutionResult {
    /// `None` when the process exited successfully.
    pub error: Option<Error>,
    /// Stderr text that could not be delivered to the view.
    pub error_output: String,
    pub process_state: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything about the child that is guarded by the executor's lock.
#[derive(Debug, Default)]
struct ProcessSlot {
    pid: Option<u32>,
    /// Set by [`Executor::shutdown`]; no new run may start afterwards.
    shut_down: bool,
}

#[derive(Debug)]
pub struct Executor {
    backend: Backend,
    command: String,
    dir: PathBuf,
    pty_size: PtySize,
    process: Mutex<ProcessSlot>,
}

impl Executor {
    /// Validates the back-end without starting anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the back-end name is unsupported or its
    /// executable cannot be found.
    pub fn new(backend: &str, command: impl Into<String>, dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_backend(Backend::resolve(backend)?, command, dir))
    }

    pub fn with_backend(backend: Backend, command: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        Self {
            backend,
            command: command.into(),
            dir: dir.as_ref().to_path_buf(),
            pty_size: DEFAULT_PTY_SIZE,
            process: Mutex::new(ProcessSlot::default()),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn running(&self) -> bool {
        self.process.lock().pid.is_some()
    }

    /// Runs the command to completion, streaming its output into `sink`.
    ///
    /// Blocks until every output stream has closed and the process has
    /// been waited on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if a run is already in flight,
    /// [`Error::ShutDown`] after [`Executor::shutdown`], or the spawn error
    /// if the process could not be started. A process that starts but fails
    /// is reported through [`ExecutionResult::error`].
    pub fn run(&self, sink: &OutputSink) -> Result<ExecutionResult> {
        let mut process = self.start()?;
        let _reset = ResetOnDrop(self);

        let undelivered = Mutex::new(String::new());
        let streams = std::mem::take(&mut process.streams);
        thread::scope(|scope| {
            for stream in streams {
                let sink = sink.clone();
                let undelivered = &undelivered;
                scope.spawn(move || output::forward_lines(stream, &sink, undelivered));
            }
        });

        let pid = process.pid;
        let (error, process_state) = match self.reap(&mut process) {
            Ok(state) if state.success => (None, state.description),
            Ok(state) => (
                Some(Error::ProcessExit {
                    state: state.description.clone(),
                }),
                state.description,
            ),
            Err(e) => {
                let state = format!("wait failed: {e}");
                (Some(Error::ProcessExit { state: state.clone() }), state)
            }
        };
        info!("Process {pid} finished: {process_state}");

        Ok(ExecutionResult {
            error,
            error_output: undelivered.into_inner(),
            process_state,
        })
    }

    /// Sends `signal` to the process group of the running child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no run is in flight, or the delivery error.
    pub fn signal(&self, signal: Signal) -> Result<()> {
        let process = self.process.lock();
        let Some(pid) = process.pid else {
            return Err(Error::NotRunning);
        };

        debug!("Sending {signal} to process group {pid}");
        signal::signal_process_group(pid, signal)
    }

    /// Kills the running child and everything in its process group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no run is in flight.
    pub fn stop(&self) -> Result<()> {
        self.signal(Signal::Kill)
    }

    /// Stops the executor for good: kills a running child and refuses
    /// every later run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no run is in flight. The executor
    /// is shut down either way.
    pub fn shutdown(&self) -> Result<()> {
        let mut process = self.process.lock();
        process.shut_down = true;
        let Some(pid) = process.pid else {
            return Err(Error::NotRunning);
        };

        debug!("Shutting down process group {pid}");
        signal::signal_process_group(pid, Signal::Kill)
    }

    pub fn is_shut_down(&self) -> bool {
        self.process.lock().shut_down
    }

    fn start(&self) -> Result<process::SpawnedProcess> {
        let mut process = self.process.lock();
        if process.shut_down {
            return Err(Error::ShutDown);
        }
        if process.pid.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let spawned = process::spawn(&self.backend, &self.command, &self.dir, self.pty_size)?;
        info!(
            "Started `{}` via {} as pid {}",
            self.command,
            self.backend.name(),
            spawned.pid
        );
        process.pid = Some(spawned.pid);

        Ok(spawned)
    }

    // Reaping and forgetting the pid happen under one lock, so a signal can
    // never reach a process group id the system has already recycled.
    fn reap(&self, spawned: &mut process::SpawnedProcess) -> io::Result<process::ProcessState> {
        loop {
            {
                let mut process = self.process.lock();
                match spawned.try_wait() {
                    Ok(Some(state)) => {
                        process.pid = None;
                        return Ok(state);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        process.pid = None;
                        return Err(e);
                    }
                }
            }
            thread::sleep(REAP_INTERVAL);
        }
    }

    fn reset(&self) {
        self.process.lock().pid = None;
    }
}

struct ResetOnDrop<'a>(&'a Executor);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.reset();
    }
}
