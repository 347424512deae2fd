//! The dashboard controller.
//!
//! On every layout pass the controller asks the layout engine for regions
//! and applies them to the rendering surface. The first time a command gets
//! a region its view is created and its executor is dispatched on its own
//! thread; later passes only move and raise the view.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::command_definitions::CommandSpec;
use crate::config::TOO_SMALL_NOTICE;
use crate::error::{Error, Result};
use crate::execution::Executor;
use crate::layout::{self, Layout, LayoutThresholds, Region};
use crate::output::{OutputSink, UpdateSender};

/// Name of the full-screen view shown while the terminal is too small.
pub const NOTICE_VIEW: &str = "too-small";

/// The stable view name of the command at `index`.
pub fn view_name(index: usize) -> String {
    format!("cmd{index}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub title: String,
    pub wrap: bool,
    pub autoscroll: bool,
}

/// The rendering surface as the controller sees it.
///
/// Implementations own the view buffers; content arrives separately
/// through the update queue of [`crate::output`].
pub trait Surface {
    /// Terminal size as (width, height) in cells.
    fn size(&self) -> (u16, u16);

    /// Places the view at `region`, creating it if needed. Returns true
    /// if the view was created by this call.
    fn set_view(&mut self, name: &str, region: Region) -> Result<bool>;

    fn configure_view(&mut self, name: &str, options: ViewOptions) -> Result<()>;

    fn set_view_on_top(&mut self, name: &str) -> Result<()>;

    /// Removes the view. Returns false if there was no such view.
    fn delete_view(&mut self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// No window has been placed for the command yet.
    Pending,
    Running,
    CompletedOk,
    CompletedWithError,
}

impl CommandStatus {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            CommandStatus::CompletedOk | CommandStatus::CompletedWithError
        )
    }
}

/// Every executor that has been dispatched, so shutdown can reach them all.
///
/// Entries are only ever appended; finished executors stay listed.
#[derive(Debug, Default)]
pub struct ExecutorRegistry {
    executors: Mutex<Vec<Arc<Executor>>>,
}

impl ExecutorRegistry {
    pub fn register(&self, executor: Arc<Executor>) {
        self.executors.lock().push(executor);
    }

    pub fn len(&self) -> usize {
        self.executors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.lock().is_empty()
    }

    pub fn running(&self) -> usize {
        self.executors
            .lock()
            .iter()
            .filter(|executor| executor.running())
            .count()
    }

    /// Shuts down every registered executor and returns how many running
    /// commands were signalled.
    ///
    /// Does not wait for the processes to exit. Executors that already
    /// finished are skipped quietly, and ones that have not started yet
    /// never will.
    pub fn stop_all(&self) -> usize {
        let executors = self.executors.lock().clone();

        thread::scope(|scope| {
            let handles: Vec<_> = executors
                .iter()
                .map(|executor| scope.spawn(move || stop_quietly(executor)))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(false))
                .filter(|stopped| *stopped)
                .count()
        })
    }
}

fn stop_quietly(executor: &Executor) -> bool {
    match executor.shutdown() {
        Ok(()) => true,
        Err(Error::NotRunning) => {
            debug!("`{}` already finished", executor.command());
            false
        }
        Err(e) => {
            warn!("Could not stop `{}`: {}", executor.command(), e);
            false
        }
    }
}

struct CommandWindow {
    spec: CommandSpec,
    executor: Arc<Executor>,
    status: Arc<Mutex<CommandStatus>>,
}

pub struct Dashboard {
    windows: Vec<CommandWindow>,
    thresholds: LayoutThresholds,
    updates: UpdateSender,
    registry: Arc<ExecutorRegistry>,
    too_small: bool,
}

impl Dashboard {
    /// Builds an executor for every command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCommands`] for an empty list, or the first
    /// back-end resolution error.
    pub fn new(
        commands: Vec<CommandSpec>,
        thresholds: LayoutThresholds,
        updates: UpdateSender,
    ) -> Result<Self> {
        if commands.is_empty() {
            return Err(Error::NoCommands);
        }

        let windows = commands
            .into_iter()
            .map(|spec| {
                let executor = Executor::new(&spec.shell, &spec.command, &spec.working_directory)?;
                Ok(CommandWindow {
                    spec,
                    executor: Arc::new(executor),
                    status: Arc::new(Mutex::new(CommandStatus::Pending)),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            windows,
            thresholds,
            updates,
            registry: Arc::new(ExecutorRegistry::default()),
            too_small: false,
        })
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn registry(&self) -> Arc<ExecutorRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn status(&self, index: usize) -> Option<CommandStatus> {
        self.windows.get(index).map(|window| *window.status.lock())
    }

    pub fn is_too_small(&self) -> bool {
        self.too_small
    }

    /// Best-effort shutdown: signals every dispatched executor.
    pub fn stop(&self) {
        let stopped = self.registry.stop_all();
        info!("Stopped {stopped} running command(s)");
    }

    /// One layout pass over `surface`.
    ///
    /// # Errors
    ///
    /// Propagates surface errors.
    pub fn layout<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<()> {
        let (width, height) = surface.size();

        match layout::compute(width, height, self.windows.len(), self.thresholds) {
            Layout::TooSmall { notice } => {
                if !self.too_small {
                    info!("Terminal {width}x{height} is too small for the command windows");
                    self.too_small = true;
                }

                if surface.set_view(NOTICE_VIEW, notice)? {
                    surface.configure_view(
                        NOTICE_VIEW,
                        ViewOptions {
                            title: String::new(),
                            wrap: true,
                            autoscroll: false,
                        },
                    )?;
                    self.updates.sink(NOTICE_VIEW).write_line(TOO_SMALL_NOTICE);
                }
                surface.set_view_on_top(NOTICE_VIEW)?;
            }
            Layout::Grid(grid) => {
                if self.too_small {
                    info!("Terminal {width}x{height} fits the command windows again");
                    self.too_small = false;
                }
                surface.delete_view(NOTICE_VIEW);

                for (index, region) in grid.regions.into_iter().enumerate() {
                    let name = view_name(index);
                    if surface.set_view(&name, region)? {
                        surface.configure_view(
                            &name,
                            ViewOptions {
                                title: self.windows[index].spec.title(),
                                wrap: true,
                                autoscroll: true,
                            },
                        )?;
                    } else {
                        surface.set_view_on_top(&name)?;
                    }

                    if *self.windows[index].status.lock() == CommandStatus::Pending {
                        self.dispatch(index);
                    }
                }
            }
        }

        Ok(())
    }

    fn dispatch(&self, index: usize) {
        let window = &self.windows[index];
        *window.status.lock() = CommandStatus::Running;
        self.registry.register(Arc::clone(&window.executor));

        let name = view_name(index);
        let sink = self.updates.sink(name.as_str());
        let executor = Arc::clone(&window.executor);
        let status = Arc::clone(&window.status);
        let title = window.spec.title();

        let spawned = thread::Builder::new()
            .name(format!("multi-watch-{name}"))
            .spawn({
                let sink = sink.clone();
                move || run_command(&executor, &title, &sink, &status)
            });

        if let Err(e) = spawned {
            error!("Could not start a thread for `{name}`: {e}");
            sink.write_line(e.to_string());
            *window.status.lock() = CommandStatus::CompletedWithError;
        }
    }
}

/// Runs one command to completion on an emptied window, framing its
/// output with start and completion lines.
pub fn run_command(
    executor: &Executor,
    title: &str,
    sink: &OutputSink,
    status: &Mutex<CommandStatus>,
) {
    sink.clear();
    sink.write_line(format!(">> {title}"));
    *status.lock() = CommandStatus::Running;

    let started = Instant::now();
    let outcome = match executor.run(sink) {
        Ok(result) => {
            if !result.error_output.is_empty() {
                warn!("Undelivered stderr of `{title}`: {}", result.error_output.trim_end());
            }

            match result.error {
                None => {
                    sink.write_line(format!(">> Done ({:?})", started.elapsed()));
                    CommandStatus::CompletedOk
                }
                Some(error) => {
                    sink.write_line(error.to_string());
                    CommandStatus::CompletedWithError
                }
            }
        }
        Err(error) => {
            sink.write_line(error.to_string());
            CommandStatus::CompletedWithError
        }
    };

    *status.lock() = outcome;
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::output::{update_channel, UpdateReceiver, ViewUpdate};
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSurface {
        size: (u16, u16),
        views: BTreeMap<String, Region>,
        options: BTreeMap<String, ViewOptions>,
        created: Vec<String>,
        on_top: Vec<String>,
    }

    impl FakeSurface {
        fn new(width: u16, height: u16) -> Self {
            Self {
                size: (width, height),
                ..Self::default()
            }
        }
    }

    impl Surface for FakeSurface {
        fn size(&self) -> (u16, u16) {
            self.size
        }

        fn set_view(&mut self, name: &str, region: Region) -> Result<bool> {
            let created = self.views.insert(name.to_string(), region).is_none();
            if created {
                self.created.push(name.to_string());
            }
            Ok(created)
        }

        fn configure_view(&mut self, name: &str, options: ViewOptions) -> Result<()> {
            if !self.views.contains_key(name) {
                return Err(Error::UnknownView(name.to_string()));
            }
            self.options.insert(name.to_string(), options);
            Ok(())
        }

        fn set_view_on_top(&mut self, name: &str) -> Result<()> {
            self.on_top.push(name.to_string());
            Ok(())
        }

        fn delete_view(&mut self, name: &str) -> bool {
            self.views.remove(name).is_some()
        }
    }

    fn dashboard(commands: &[&str]) -> (Dashboard, UpdateReceiver) {
        let (sender, receiver) = update_channel();
        let specs = commands
            .iter()
            .map(|command| CommandSpec::new(*command, "sh", std::env::temp_dir()))
            .collect();
        let dashboard = Dashboard::new(specs, LayoutThresholds::default(), sender).unwrap();
        (dashboard, receiver)
    }

    fn wait_for(dashboard: &Dashboard, index: usize, done: impl Fn(CommandStatus) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done(dashboard.status(index).unwrap()) {
            assert!(Instant::now() < deadline, "timed out waiting for cmd{index}");
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn lines_for(receiver: &UpdateReceiver, view: &str) -> Vec<String> {
        let mut lines = Vec::new();
        receiver.drain(|update| {
            if let ViewUpdate::Append { view: target, line } = update {
                if target == view {
                    lines.push(line);
                }
            }
        });
        lines
    }

    #[test]
    fn test_no_commands() {
        let (sender, _receiver) = update_channel();
        let result = Dashboard::new(Vec::new(), LayoutThresholds::default(), sender);
        assert!(matches!(result, Err(Error::NoCommands)));
    }

    #[test]
    fn test_unsupported_shell_is_a_startup_error() {
        let (sender, _receiver) = update_channel();
        let specs = vec![CommandSpec::new("ls", "fish", ".")];
        let result = Dashboard::new(specs, LayoutThresholds::default(), sender);
        assert!(matches!(result, Err(Error::UnsupportedShell(_))));
    }

    #[test]
    fn test_echo_window_output() {
        let (mut dashboard, receiver) = dashboard(&["echo hi"]);
        let mut surface = FakeSurface::new(120, 40);

        dashboard.layout(&mut surface).unwrap();
        assert_eq!(surface.options["cmd0"].title, "echo hi");
        assert!(surface.options["cmd0"].autoscroll && surface.options["cmd0"].wrap);

        wait_for(&dashboard, 0, CommandStatus::is_finished);
        assert_eq!(dashboard.status(0), Some(CommandStatus::CompletedOk));

        let lines = lines_for(&receiver, "cmd0");
        assert_eq!(lines.len(), 3, "{lines:?}");
        assert_eq!(lines[0], ">> echo hi");
        assert_eq!(lines[1], "hi");
        assert!(lines[2].starts_with(">> Done (") && lines[2].ends_with(')'));
    }

    #[test]
    fn test_failing_command_reports_exit_status() {
        let (mut dashboard, receiver) = dashboard(&["false"]);
        dashboard.layout(&mut FakeSurface::new(120, 40)).unwrap();

        wait_for(&dashboard, 0, CommandStatus::is_finished);
        assert_eq!(dashboard.status(0), Some(CommandStatus::CompletedWithError));

        let lines = lines_for(&receiver, "cmd0");
        assert_eq!(lines[0], ">> false");
        assert_eq!(lines[1], "exit status: 1");
    }

    #[test]
    fn test_spawn_error_is_reported_in_window() {
        let (sender, receiver) = update_channel();
        let specs = vec![CommandSpec::new("true", "sh", "/this/path/does/not/exist")];
        let mut dashboard = Dashboard::new(specs, LayoutThresholds::default(), sender).unwrap();

        dashboard.layout(&mut FakeSurface::new(120, 40)).unwrap();
        wait_for(&dashboard, 0, CommandStatus::is_finished);

        let lines = lines_for(&receiver, "cmd0");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Error spawning sub process"));
    }

    #[test]
    fn test_later_passes_do_not_dispatch_again() {
        let (mut dashboard, _receiver) = dashboard(&["true", "true"]);
        let mut surface = FakeSurface::new(120, 40);

        for _ in 0..3 {
            dashboard.layout(&mut surface).unwrap();
        }

        assert_eq!(surface.created, vec!["cmd0", "cmd1"]);
        assert_eq!(dashboard.registry().len(), 2);
        // every pass after the first raises the existing windows
        assert_eq!(surface.on_top.len(), 4);
    }

    #[test]
    fn test_too_small_terminal_defers_dispatch() {
        let (mut dashboard, receiver) = dashboard(&["echo late"]);
        let mut surface = FakeSurface::new(30, 5);

        dashboard.layout(&mut surface).unwrap();
        assert!(dashboard.is_too_small());
        assert_eq!(surface.created, vec![NOTICE_VIEW]);
        assert_eq!(dashboard.status(0), Some(CommandStatus::Pending));
        assert!(dashboard.registry().is_empty());
        assert_eq!(lines_for(&receiver, NOTICE_VIEW), vec![TOO_SMALL_NOTICE]);

        surface.size = (120, 40);
        dashboard.layout(&mut surface).unwrap();
        assert!(!dashboard.is_too_small());
        assert!(!surface.views.contains_key(NOTICE_VIEW));
        wait_for(&dashboard, 0, CommandStatus::is_finished);
    }

    #[test]
    fn test_resize_below_threshold_keeps_windows_running() {
        let (mut dashboard, _receiver) = dashboard(&["sleep 5", "true", "true"]);
        let mut surface = FakeSurface::new(160, 40);

        dashboard.layout(&mut surface).unwrap();
        let registered = dashboard.registry().len();

        surface.size = (160, 8);
        dashboard.layout(&mut surface).unwrap();
        assert!(dashboard.is_too_small());
        assert_eq!(surface.on_top.last().map(String::as_str), Some(NOTICE_VIEW));

        surface.size = (160, 40);
        dashboard.layout(&mut surface).unwrap();
        assert!(!surface.views.contains_key(NOTICE_VIEW));
        assert_eq!(dashboard.registry().len(), registered);
        assert_eq!(
            surface.created,
            vec!["cmd0", "cmd1", "cmd2", NOTICE_VIEW],
            "windows are restored, not recreated"
        );

        dashboard.stop();
    }

    #[test]
    fn test_stop_signals_running_commands() {
        let (mut dashboard, _receiver) = dashboard(&["sleep 30", "true"]);
        dashboard.layout(&mut FakeSurface::new(120, 40)).unwrap();

        wait_for(&dashboard, 1, CommandStatus::is_finished);
        let deadline = Instant::now() + Duration::from_secs(5);
        while dashboard.registry().running() == 0 {
            assert!(Instant::now() < deadline, "sleep never started");
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(dashboard.registry().stop_all(), 1);
        wait_for(&dashboard, 0, CommandStatus::is_finished);
        assert_eq!(dashboard.status(0), Some(CommandStatus::CompletedWithError));

        // a second shutdown finds nothing left to stop
        assert_eq!(dashboard.registry().stop_all(), 0);
    }

    #[test]
    fn test_run_starts_on_a_cleared_window() {
        let (mut dashboard, receiver) = dashboard(&["echo hi"]);
        dashboard.layout(&mut FakeSurface::new(120, 40)).unwrap();
        wait_for(&dashboard, 0, CommandStatus::is_finished);

        let mut updates = Vec::new();
        receiver.drain(|update| updates.push(update));

        assert!(
            matches!(&updates[0], ViewUpdate::Clear { view } if view == "cmd0"),
            "{updates:?}"
        );
        assert!(
            matches!(&updates[1], ViewUpdate::Append { line, .. } if line == ">> echo hi"),
            "{updates:?}"
        );
    }

    #[test]
    fn test_registered_command_never_starts_after_shutdown() {
        let (sender, receiver) = update_channel();
        let registry = ExecutorRegistry::default();
        let executor = Arc::new(Executor::new("sh", "echo too late", std::env::temp_dir()).unwrap());
        registry.register(Arc::clone(&executor));

        // quit arrives between registering and the worker starting the child
        assert_eq!(registry.stop_all(), 0);

        let status = Mutex::new(CommandStatus::Pending);
        run_command(&executor, "echo too late", &sender.sink("cmd0"), &status);

        assert_eq!(*status.lock(), CommandStatus::CompletedWithError);
        assert!(!executor.running());
        assert_eq!(
            lines_for(&receiver, "cmd0"),
            vec![">> echo too late", "executor was shut down"]
        );
    }
}
