//! # Line-charge Sim
//!
//! Headless driver for the line-charge flight core.
//!
//! Acts as the external scheduler: loads a scenario, advances one flight per
//! tick with a seeded RNG, and streams the published events as JSON lines.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod cli;
mod config;
mod runner;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use linecharge_physics::FlightSaveData;

use crate::cli::Cli;
use crate::runner::ScenarioRunner;

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays pure JSON lines
    let filter = EnvFilter::from_default_env().add_directive("linecharge=info".parse()?);
    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
    }

    info!("linecharge-sim {}", env!("CARGO_PKG_VERSION"));

    let config = cli.scenario();
    if let Some(path) = &cli.write_config {
        config.save_to(path)?;
    }

    let mut runner = match &cli.resume {
        Some(path) => {
            let save = FlightSaveData::load_from(path)?;
            info!("Resuming flight from {} at tick {}", path.display(), cli.start_tick);
            ScenarioRunner::resume(config, &save, cli.start_tick)?
        },
        None => ScenarioRunner::new(config)?,
    };

    let report = match &cli.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            let report = runner.run(&mut out)?;
            out.flush()?;
            report
        },
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            runner.run(&mut out)?
        },
    };

    info!(
        ticks = report.ticks,
        finished = report.finished,
        detonations = report.detonations,
        landing_tick = ?report.landing_tick,
        phase = ?runner.phase(),
        "Flight report"
    );

    if let Some(path) = &cli.save {
        match runner.save_data() {
            Some(save) => {
                save.save_to(path)?;
                info!("Saved flight to {} (next tick {})", path.display(), runner.tick());
            },
            None => warn!("Flight never launched, nothing to save"),
        }
    }

    Ok(())
}
