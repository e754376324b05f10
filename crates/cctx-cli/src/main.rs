use std::process::ExitCode;

use cctx_store::ContextError;
use clap::Parser;
use colored::Colorize;
use tracing::Level;

mod cli;
mod commands;
mod config;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let config = match config::CliConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            return ExitCode::from(cctx_types::ErrorKind::Validation.exit_code() as u8);
        }
    };

    if !config.color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose, config.log_level.as_deref());

    match commands::run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(verbose: bool, configured: Option<&str>) {
    let level = if verbose {
        Level::DEBUG
    } else {
        configured
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or(Level::WARN)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ContextError>()
        .map(|e| e.kind().exit_code() as u8)
        .unwrap_or(1)
}
