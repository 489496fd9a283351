//! Command-line interface for `linecharge-sim`.
//!
//! ```bash
//! # Run the built-in scenario
//! linecharge-sim
//!
//! # Run a scenario file with a fixed seed, events to a file
//! linecharge-sim --config scenario.toml --seed 42 --output events.jsonl
//!
//! # Stop after 60 ticks and save, then resume
//! linecharge-sim --max-ticks 60 --save flight.lcfs
//! linecharge-sim --resume flight.lcfs --start-tick 60
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::config::SimConfig;

/// Headless line-charge flight driver.
///
/// Runs one flight tick by tick and prints every event it publishes as a
/// JSON line.
#[derive(Parser, Debug, Clone)]
#[command(name = "linecharge-sim", author, version, about)]
pub struct Cli {
    /// Scenario file (TOML)
    ///
    /// Missing or invalid files fall back to the built-in scenario
    #[arg(long, short = 'c', env = "LINECHARGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// RNG seed, overriding the scenario
    #[arg(long, short = 's', env = "LINECHARGE_SEED")]
    pub seed: Option<u64>,

    /// Tick limit, overriding the scenario
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Write events here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Save the flight here when the run stops
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Resume a saved flight instead of launching a new one
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Tick the resumed flight continues from
    #[arg(long, default_value_t = 0, requires = "resume")]
    pub start_tick: u64,

    /// Write the effective scenario to this file and continue
    #[arg(long)]
    pub write_config: Option<PathBuf>,

    /// Log as JSON instead of text
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Loads the scenario and applies command-line overrides.
    pub fn scenario(&self) -> SimConfig {
        let mut config = self
            .config
            .as_ref()
            .map_or_else(SimConfig::default, SimConfig::load_from);

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        config.validate();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["linecharge-sim"]).expect("parse");
        assert!(cli.config.is_none());
        assert_eq!(cli.start_tick, 0);
        assert_eq!(cli.scenario(), {
            let mut config = SimConfig::default();
            config.validate();
            config
        });
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from(["linecharge-sim", "--seed", "42", "--max-ticks", "90"]).expect("parse");
        let config = cli.scenario();
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_ticks, 90);
    }

    #[test]
    fn test_start_tick_requires_resume() {
        assert!(Cli::try_parse_from(["linecharge-sim", "--start-tick", "5"]).is_err());
        let cli = Cli::try_parse_from(["linecharge-sim", "--resume", "f.lcfs", "--start-tick", "5"]).expect("parse");
        assert_eq!(cli.start_tick, 5);
    }
}
