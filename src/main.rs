//! Main entry point for the application.
//!
//! This module initializes logging, loads environment variables and the task
//! inputs, then runs the selected task once.

use clap::Parser;
use sfx_tasks::cli::Cli;
use sfx_tasks::core::TaskKind;
use sfx_tasks::errors::{Error, Result};
use sfx_tasks::surfex::CommandLibrary;
use sfx_tasks::utils;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list {
        for kind in TaskKind::ALL {
            println!("{kind}");
        }
        return ExitCode::SUCCESS;
    }

    utils::init_logging(cli.log_level(), cli.log_dir.as_deref());

    if let Err(e) = dotenvy::dotenv() {
        warn!("Failed to load .env file: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let kind = cli
        .task
        .ok_or_else(|| Error::InvalidArgument("a task name is required".to_string()))?;
    let lifecycle = kind.construct(cli.task_inputs()?)?;
    let library = CommandLibrary::new(Some(lifecycle.context().bindir.clone()));

    match cli.timeout {
        Some(timeout) => {
            info!("Running {} with a timeout of {}", kind, humantime::format_duration(timeout));
            lifecycle.run_with_timeout(library, timeout)
        }
        None => lifecycle.run(&library),
    }
}
