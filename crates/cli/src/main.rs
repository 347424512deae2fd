use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};
use multi_watch_cli::cli_args::{Args, Internal};
use multi_watch_cli::exec;
use multi_watch_cli::surface::{Control, KeyBinding, TerminalSurface};
use multi_watch_core::command_definitions::CommandSpec;
use multi_watch_core::dashboard::Dashboard;
use multi_watch_core::error::{Error, Result};
use multi_watch_core::output::update_channel;
use multi_watch_core::{config, file_handling};

fn init_logging(log_file: Option<&str>) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();

    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| Error::io_error("log".to_string(), path.to_string(), e))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Commands from `--cmd` first, then those of the command file.
fn collect_commands(args: &Args) -> Result<Vec<CommandSpec>> {
    let dir = config::resolve_working_directory(&args.dir)?;
    debug!("Working directory: `{}`", dir.display());

    let mut commands = Vec::with_capacity(args.cmd.len());
    for (index, command) in args.cmd.iter().enumerate() {
        if command.trim().is_empty() {
            return Err(Error::EmptyCommand { index });
        }
        commands.push(CommandSpec::new(command, &args.shell, &dir));
    }

    if let Some(config_path) = &args.config {
        let config_path = config::get_config_path(config_path);
        debug!("Config path: `{}`", config_path);

        let definitions = file_handling::get_command_definitions(&config_path)?;
        commands.extend(
            definitions
                .iter()
                .map(|definition| CommandSpec::from_command_definition(definition, &args.shell, &dir)),
        );
    }

    Ok(commands)
}

fn run_dashboard(args: &Args) -> Result<()> {
    let commands = collect_commands(args)?;
    info!("Starting {} command(s)", commands.len());

    let (sender, receiver) = update_channel();
    // Built before the terminal is touched so bad configuration never renders.
    let mut dashboard = Dashboard::new(commands, args.thresholds(), sender)?;

    let mut surface = TerminalSurface::new(receiver)?;
    let registry = dashboard.registry();
    surface.bind(KeyBinding::ctrl('c'), move || {
        let stopped = registry.stop_all();
        info!("Quit requested, stopped {stopped} command(s)");
        Control::Quit
    })?;

    let result = surface.main_loop(|screen| dashboard.layout(screen));
    if result.is_err() {
        dashboard.stop();
    }

    result
}

fn execute() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    if let Some(Internal::Exec { command }) = &args.internal {
        return exec::exec_command(command);
    }

    run_dashboard(&args)?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match execute() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
