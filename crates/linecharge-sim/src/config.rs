//! Scenario configuration.
//!
//! A scenario is one flight: where the launcher stands, where it aims, how big
//! the map is, and the flight tuning. It is loaded from and saved to TOML.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{info, warn};

use linecharge_physics::{FlightConfig, RectBounds};

/// Scenario parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run Settings ===
    /// RNG seed
    pub seed: u64,
    /// Hard stop for the tick loop
    pub max_ticks: u64,
    /// Event bus capacity
    pub event_capacity: usize,

    // === Geometry ===
    /// Launcher position on the plane
    pub launcher: Vec2,
    /// Aim point on the plane
    pub target: Vec2,
    /// Map width in cells
    pub map_width: i32,
    /// Map depth in cells
    pub map_depth: i32,

    /// Flight tuning
    pub flight: FlightConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x11E_C4A6,
            max_ticks: 3_600,
            event_capacity: 4_096,

            launcher: Vec2::new(32.0, 32.0),
            target: Vec2::new(32.0, 52.0),
            map_width: 128,
            map_depth: 128,

            flight: FlightConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Scenario file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read scenario file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded scenario from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse scenario file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open scenario file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved scenario to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.max_ticks = self.max_ticks.clamp(1, 1_000_000);
        self.event_capacity = self.event_capacity.clamp(64, 1 << 20);
        self.map_width = self.map_width.max(1);
        self.map_depth = self.map_depth.max(1);
        self.flight.validate();
    }

    /// Map extent as detonation bounds.
    #[must_use]
    pub fn bounds(&self) -> RectBounds {
        RectBounds::new(self.map_width, self.map_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linecharge_physics::MapBounds;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.flight.node_count, 40);
        assert!(config.bounds().contains_plane(config.target));
        assert!(config.bounds().contains_plane(config.launcher));
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        config.max_ticks = 0;
        config.map_width = -5;
        config.flight.rope_length_factor = 10.0;

        config.validate();

        assert_eq!(config.max_ticks, 1);
        assert_eq!(config.map_width, 1);
        assert!((config.flight.rope_length_factor - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("scenario.toml");

        let mut config = SimConfig::default();
        config.seed = 12345;
        config.target = Vec2::new(50.0, 40.0);
        config.flight.detonation_delay_ticks = 30;
        config.flight.rope.drag_air = 0.97;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(
            &config_path,
            "seed = 7\ntarget = [40.0, 40.0]\n\n[flight]\nnode_count = 24\ncharge_start = 12\n",
        )
        .expect("write");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.target, Vec2::new(40.0, 40.0));
        assert_eq!(loaded.flight.node_count, 24);
        assert_eq!(loaded.flight.charge_start, 12);
        assert_eq!(loaded.max_ticks, SimConfig::default().max_ticks);
        assert!((loaded.flight.gravity - 0.0055).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/scenario.toml");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "seed = \"not a number\"").expect("write");

        let config = SimConfig::load_from(&config_path);
        assert_eq!(config, SimConfig::default());
    }
}
