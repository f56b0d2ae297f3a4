use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mathhelper::cli::{Cli, Commands};
use mathhelper::config::Config;
use mathhelper::utils::error::{AppError, report_error};
use mathhelper::utils::output::OutputStyle;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            match err.downcast_ref::<AppError>() {
                Some(app_err) => report_error(app_err),
                None => eprintln!("❌ {}", OutputStyle::error(&format!("{:#}", err))),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config_path = cli.config_path();
    let mut config = Config::load_custom(&config_path)?;
    cli.apply_overrides(&mut config);

    if !config.general.color {
        colored::control::set_override(false);
    }

    // No subcommand starts the interactive session
    let command = cli.command.unwrap_or(Commands::Repl);
    command.execute(config, config_path)
}

/// Logs go to stderr so stdout carries only the query protocol.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
