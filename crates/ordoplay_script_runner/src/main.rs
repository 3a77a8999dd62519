// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` script runner.
//!
//! Loads a script graph document, runs its begin play entry once and then
//! ticks it at a fixed rate, without an editor attached.

mod error;
mod runner;
mod settings;

use clap::Parser;
use error::RunnerError;
use runner::Runner;
use settings::{RunnerSettings, SETTINGS_FILE_NAME};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run an OrdoPlay script graph headlessly")]
struct Args {
    /// Graph document to run, overriding the settings file
    graph: Option<PathBuf>,
    /// Runner settings file (RON)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Number of frames to tick
    #[arg(long)]
    frames: Option<u32>,
    /// Tick rate in Hz
    #[arg(long)]
    tick_rate: Option<u32>,
    /// Sleep between frames to match wall-clock time
    #[arg(long)]
    realtime: bool,
    /// Write the effective settings to this file and exit
    #[arg(long)]
    write_settings: Option<PathBuf>,
}

fn load_settings(args: &Args) -> Result<RunnerSettings, RunnerError> {
    let mut settings = match &args.settings {
        Some(path) => RunnerSettings::load(path)?,
        None if Path::new(SETTINGS_FILE_NAME).exists() => {
            RunnerSettings::load(Path::new(SETTINGS_FILE_NAME))?
        }
        None => RunnerSettings::default(),
    };
    if let Some(graph) = &args.graph {
        settings.graph.clone_from(graph);
    }
    if let Some(frames) = args.frames {
        settings.frames = frames;
    }
    if let Some(rate) = args.tick_rate {
        if rate == 0 {
            return Err(RunnerError::InvalidTickRate);
        }
        settings.tick_rate = rate;
    }
    settings.realtime |= args.realtime;
    Ok(settings)
}

fn run(settings: RunnerSettings) -> Result<(), RunnerError> {
    let registry = ordoplay_script_graph::bootstrap()?;
    let mut runner = Runner::load(registry, settings)?;
    let summary = runner.run()?;
    tracing::info!(
        graph = %runner.graph().name,
        frames = summary.frames,
        errors = summary.errors,
        graph_time = summary.graph_time,
        "Run finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("ordoplay-script: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.write_settings {
        return match settings.save(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("ordoplay-script: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrdoPlay script runner v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(settings) {
        tracing::error!("Script runner failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
