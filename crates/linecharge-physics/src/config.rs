//! Flight tuning parameters.
//!
//! Everything that shapes a flight lives here so hosts can load it from a
//! data file. Defaults reproduce the stock line charge.

use serde::{Deserialize, Serialize};

use linecharge_common::FlightError;

use crate::ballistics::{BallisticSolver, DEFAULT_FALLBACK_ANGLE_DEG, DEFAULT_RANGE_CORRECTION};
use crate::rope::RopeTuning;

/// Per-flight configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    // === Rope Topology ===
    /// Number of rope nodes, anchors included
    pub node_count: usize,
    /// First node index of the explosive segment
    pub charge_start: usize,
    /// Mass of cable nodes before the charge segment
    pub light_mass: f32,
    /// Mass of charge-bearing nodes
    pub heavy_mass: f32,
    /// Rope length as a multiple of the horizontal launch distance
    pub rope_length_factor: f32,
    /// Distance-constraint passes per tick
    pub solver_iterations: usize,

    // === Launch ===
    /// Launch speed in tiles per tick
    pub launch_speed: f32,
    /// Downward acceleration in tiles per tick squared
    pub gravity: f32,
    /// Height of the launcher's rope anchor and the projectile's start
    pub launcher_height: f32,
    /// How far behind the origin the anchor sits, in tiles
    pub launcher_setback: f32,
    /// Range multiplier compensating Euler drift
    pub range_correction: f32,
    /// Elevation used when the target is out of reach
    pub fallback_angle_deg: f32,
    /// Fraction of the launch distance flown under boost
    pub boost_fraction: f32,

    // === Detonation ===
    /// Ticks between landing and detonation
    pub detonation_delay_ticks: u64,
    /// Explosion radius handed to the explosion system
    pub explosion_radius: f32,
    /// Damage type name handed to the explosion system
    pub damage_kind: String,

    // === Timing ===
    /// Simulation ticks per second (drives the turbulence clock)
    pub ticks_per_second: f32,

    /// Rope integration constants
    pub rope: RopeTuning,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            // Rope
            node_count: 40,
            charge_start: 20,
            light_mass: 0.1,
            heavy_mass: 5.0,
            rope_length_factor: 1.28,
            solver_iterations: 40,

            // Launch
            launch_speed: 0.4,
            gravity: 0.0055,
            launcher_height: 0.55,
            launcher_setback: 0.9,
            range_correction: DEFAULT_RANGE_CORRECTION,
            fallback_angle_deg: DEFAULT_FALLBACK_ANGLE_DEG,
            boost_fraction: 0.15,

            // Detonation
            detonation_delay_ticks: 45,
            explosion_radius: 2.9,
            damage_kind: "Bomb".to_string(),

            // Timing
            ticks_per_second: 60.0,

            rope: RopeTuning::default(),
        }
    }
}

impl FlightConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Solver built from this configuration's tuning values.
    #[must_use]
    pub fn solver(&self) -> BallisticSolver {
        BallisticSolver::new(self.range_correction, self.fallback_angle_deg)
    }

    /// Checks the parameters that cannot be clamped into something sensible.
    pub fn check(&self) -> Result<(), FlightError> {
        if self.node_count < 2 {
            return Err(FlightError::InvalidNodeCount {
                count: self.node_count,
            });
        }
        if self.charge_start > self.node_count {
            return Err(FlightError::InvalidChargeStart {
                charge_start: self.charge_start,
                node_count: self.node_count,
            });
        }
        if !(self.launch_speed > 0.0) || !self.launch_speed.is_finite() {
            return Err(FlightError::InvalidParameter {
                name: "launch_speed",
                value: self.launch_speed,
            });
        }
        if !(self.gravity > 0.0) || !self.gravity.is_finite() {
            return Err(FlightError::InvalidParameter {
                name: "gravity",
                value: self.gravity,
            });
        }
        Ok(())
    }

    /// Clamps tuning values to sensible ranges.
    ///
    /// Node count, charge start, speed, and gravity are left alone; those are
    /// rejected by [`FlightConfig::check`] instead.
    pub fn validate(&mut self) {
        self.light_mass = self.light_mass.max(0.001);
        self.heavy_mass = self.heavy_mass.max(0.001);
        self.rope_length_factor = self.rope_length_factor.clamp(1.0, 4.0);
        self.solver_iterations = self.solver_iterations.clamp(1, 200);
        self.launcher_height = self.launcher_height.max(0.0);
        self.launcher_setback = self.launcher_setback.max(0.0);
        self.range_correction = self.range_correction.clamp(0.5, 2.0);
        self.fallback_angle_deg = self.fallback_angle_deg.clamp(1.0, 89.0);
        self.boost_fraction = self.boost_fraction.clamp(0.0, 1.0);
        self.explosion_radius = self.explosion_radius.max(0.0);
        self.ticks_per_second = self.ticks_per_second.clamp(1.0, 1000.0);
        self.rope.validate();
    }
}
