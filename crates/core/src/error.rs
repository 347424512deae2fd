use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No command(s) provided.")]
    NoCommands,

    #[error("Command {} has no command text.", .index)]
    EmptyCommand { index: usize },

    #[error("unsupported shell: \"{}\"", _0)]
    UnsupportedShell(String),

    #[error("{} not on path: {}", .shell, .original)]
    ShellNotFound { shell: String, original: which::Error },

    #[error("powershell/pwsh not on path")]
    PowerShellNotFound,

    #[error("already running")]
    AlreadyRunning,

    #[error("executor not running")]
    NotRunning,

    #[error("executor was shut down")]
    ShutDown,

    #[error("Error spawning sub process: {}", _0)]
    Spawn(std::io::Error),

    #[error("Error with pseudo terminal: {}", _0)]
    Pty(String),

    #[error("{}", .state)]
    ProcessExit { state: String },

    #[error("Error signalling process group {}: {}", .pid, .original)]
    Signal { pid: u32, original: std::io::Error },

    #[error("Signal {} is not supported on this platform", _0)]
    UnsupportedSignal(String),

    #[error("Error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("No commands were found in the command definition YAML. Is `{}` empty?", .path)]
    EmptyCommandDefinition { path: String },

    #[error("Unknown view `{}`", _0)]
    UnknownView(String),

    #[error("Key binding `{}` is already registered", _0)]
    DuplicateKeybinding(String),

    #[error("Could not parse command line for exec: {}", _0)]
    ExecParse(String),

    #[error("STDIO error: {}", _0)]
    Stdio(#[from] std::io::Error),
}

impl Error {
    pub fn empty_command_definition(path: String) -> Self {
        Self::EmptyCommandDefinition { path }
    }

    pub fn yaml_error(
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            file_description,
            path,
            original,
        }
    }

    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }

    pub fn pty(original: impl std::fmt::Display) -> Self {
        Self::Pty(original.to_string())
    }
}
