//! Integration tests for multi-watch-core
//!
//! These tests verify that the core functionality works together correctly
//! by testing complete workflows end-to-end.

use multi_watch_core::{
    command_definitions::CommandSpec,
    config::TOO_SMALL_NOTICE,
    dashboard::{view_name, CommandStatus, Dashboard, Surface, ViewOptions, NOTICE_VIEW},
    error::{Error, Result},
    file_handling::get_command_definitions,
    layout::{LayoutThresholds, Region},
    output::{update_channel, UpdateReceiver, ViewUpdate},
};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// A surface that applies updates the way a terminal would, minus drawing.
struct RecordingSurface {
    size: (u16, u16),
    regions: HashMap<String, Region>,
    titles: HashMap<String, String>,
    content: HashMap<String, Vec<String>>,
}

impl RecordingSurface {
    fn new(width: u16, height: u16) -> Self {
        Self {
            size: (width, height),
            regions: HashMap::new(),
            titles: HashMap::new(),
            content: HashMap::new(),
        }
    }

    fn apply(&mut self, receiver: &UpdateReceiver) {
        receiver.drain(|update| match update {
            ViewUpdate::Append { view, line } => {
                if self.regions.contains_key(&view) {
                    self.content.entry(view).or_default().push(line);
                }
            }
            ViewUpdate::Clear { view } => {
                self.content.remove(&view);
            }
        });
    }

    fn lines(&self, view: &str) -> &[String] {
        self.content.get(view).map_or(&[], Vec::as_slice)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn set_view(&mut self, name: &str, region: Region) -> Result<bool> {
        Ok(self.regions.insert(name.to_string(), region).is_none())
    }

    fn configure_view(&mut self, name: &str, options: ViewOptions) -> Result<()> {
        self.titles.insert(name.to_string(), options.title);
        Ok(())
    }

    fn set_view_on_top(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn delete_view(&mut self, name: &str) -> bool {
        self.content.remove(name);
        self.regions.remove(name).is_some()
    }
}

fn wait_until_finished(dashboard: &Dashboard) {
    let deadline = Instant::now() + Duration::from_secs(10);
    let finished = |index: usize| {
        dashboard
            .status(index)
            .is_some_and(CommandStatus::is_finished)
    };
    while !(0..dashboard.len()).all(finished) {
        assert!(Instant::now() < deadline, "commands did not finish");
        thread::sleep(Duration::from_millis(10));
    }
}

fn write_yaml(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{content}").unwrap();
    temp_file
}

/// Test loading a command file with per-entry overrides
#[test]
fn test_command_file_workflow() {
    let temp_file = write_yaml(
        r#"
- command: "cargo build"
- command: "tail -f app.log"
  shell: "bash"
  working_directory: "/var/log"
  title: "logs"
"#,
    );

    let definitions = get_command_definitions(temp_file.path().to_str().unwrap()).unwrap();
    let specs: Vec<CommandSpec> = definitions
        .iter()
        .map(|definition| CommandSpec::from_command_definition(definition, "sh", Path::new("/srv")))
        .collect();

    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].shell, "sh");
    assert_eq!(specs[0].working_directory, Path::new("/srv"));
    assert_eq!(specs[0].title(), "cargo build");
    assert_eq!(specs[1].shell, "bash");
    assert_eq!(specs[1].working_directory, Path::new("/var/log"));
    assert_eq!(specs[1].title(), "logs");
}

#[test]
fn test_command_file_errors() {
    let empty = write_yaml("[]");
    assert!(matches!(
        get_command_definitions(empty.path().to_str().unwrap()),
        Err(Error::EmptyCommandDefinition { .. })
    ));

    let blank = write_yaml("- command: \"ls\"\n- command: \"  \"\n");
    assert!(matches!(
        get_command_definitions(blank.path().to_str().unwrap()),
        Err(Error::EmptyCommand { index: 1 })
    ));

    let invalid = write_yaml("- command: [unclosed");
    assert!(matches!(
        get_command_definitions(invalid.path().to_str().unwrap()),
        Err(Error::Yaml { .. })
    ));

    assert!(matches!(
        get_command_definitions("/this/path/does/not/exist.yml"),
        Err(Error::Io { .. })
    ));
}

/// A full dashboard session: place windows, stream output, resize around
/// the threshold and shut down.
#[cfg(unix)]
#[test]
fn test_dashboard_session() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "first\nsecond\n").unwrap();

    let (sender, receiver) = update_channel();
    let specs = vec![
        CommandSpec::new("cat notes.txt", "sh", dir.path()),
        CommandSpec::new("printf 'a\\tb\\r\\n'", "sh", dir.path()),
        CommandSpec::new("echo broken 1>&2; exit 3", "sh", dir.path()),
    ];
    let mut dashboard = Dashboard::new(specs, LayoutThresholds::default(), sender).unwrap();
    let mut surface = RecordingSurface::new(150, 20);

    dashboard.layout(&mut surface).unwrap();
    assert_eq!(surface.regions[&view_name(0)], Region::new(0, 0, 49, 18));
    assert_eq!(surface.regions[&view_name(2)], Region::new(100, 0, 149, 18));
    assert_eq!(surface.titles[&view_name(1)], "printf 'a\\tb\\r\\n'");

    wait_until_finished(&dashboard);
    surface.apply(&receiver);

    assert_eq!(&surface.lines("cmd0")[..3], [">> cat notes.txt", "first", "second"]);
    assert_eq!(surface.lines("cmd1")[1], "a    b");
    assert_eq!(dashboard.status(2), Some(CommandStatus::CompletedWithError));
    assert_eq!(
        &surface.lines("cmd2")[1..],
        ["broken".to_string(), "exit status: 3".to_string()]
    );

    surface.size = (100, 19);
    dashboard.layout(&mut surface).unwrap();
    surface.apply(&receiver);
    assert!(dashboard.is_too_small());
    assert_eq!(surface.lines(NOTICE_VIEW), [TOO_SMALL_NOTICE]);

    surface.size = (150, 20);
    dashboard.layout(&mut surface).unwrap();
    assert!(!surface.regions.contains_key(NOTICE_VIEW));
    assert_eq!(surface.lines("cmd0")[1], "first");

    assert_eq!(dashboard.registry().len(), 3);
    assert_eq!(dashboard.registry().stop_all(), 0);
}

/// Windows that wrap onto a second row once the terminal narrows.
#[cfg(unix)]
#[test]
fn test_dashboard_wraps_rows() {
    let (sender, _receiver) = update_channel();
    let specs = (0..4)
        .map(|index| CommandSpec::new(format!("echo {index}"), "sh", std::env::temp_dir()))
        .collect();
    let mut dashboard = Dashboard::new(specs, LayoutThresholds::default(), sender).unwrap();
    let mut surface = RecordingSurface::new(100, 40);

    dashboard.layout(&mut surface).unwrap();

    assert_eq!(surface.regions["cmd0"], Region::new(0, 0, 49, 19));
    assert_eq!(surface.regions["cmd1"], Region::new(50, 0, 99, 19));
    assert_eq!(surface.regions["cmd2"], Region::new(0, 20, 49, 39));
    assert_eq!(surface.regions["cmd3"], Region::new(50, 20, 99, 39));

    wait_until_finished(&dashboard);
}
