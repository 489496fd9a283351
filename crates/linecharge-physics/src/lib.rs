//! # Line-charge Physics
//!
//! Flight simulation of a rocket-towed line charge.
//!
//! This crate provides the deterministic, tick-driven core:
//! - Closed-form ballistic solver (high arc with out-of-reach fallback)
//! - Euler-integrated projectile kinematics
//! - Verlet rope with mass-weighted distance constraints
//! - Flight controller (lazy launch, landing, delayed detonation)
//! - Event bus for effect and explosion systems
//! - Binary save/restore of in-flight state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ballistics;
pub mod config;
pub mod events;
pub mod flight;
pub mod geometry;
pub mod projectile;
pub mod rope;
pub mod save;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ballistics::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::flight::*;
    pub use crate::geometry::*;
    pub use crate::projectile::*;
    pub use crate::rope::*;
    pub use crate::save::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use fastrand::Rng;
    use glam::Vec2;
    use linecharge_common::WorldPos;

    #[test]
    fn test_solver_and_kinematics_agree() {
        let config = FlightConfig::default();
        let spec = LaunchSpec::solve(
            &config.solver(),
            WorldPos::new(Vec2::ZERO, config.launcher_height),
            WorldPos::on_ground(Vec2::new(0.0, 15.0)),
            config.launch_speed,
            config.gravity,
            config.launcher_setback,
        );
        let mut rocket = ProjectileKinematics::launch(&spec);
        let mut tick = 0;
        while rocket.step(tick) != StepOutcome::JustLanded {
            tick += 1;
        }
        assert!(rocket.position().plane.distance(Vec2::new(0.0, 15.0)) < 1.5);
    }

    #[test]
    fn test_flight_through_prelude() {
        let mut flight = FlightController::new(
            &Vec2::new(20.0, 20.0),
            &Vec2::new(20.0, 40.0),
            FlightConfig::default(),
        )
        .expect("valid flight");
        let mut rng = Rng::with_seed(1);
        let bus = EventBus::new(4096);
        let bounds = RectBounds::new(64, 64);

        let mut tick = 0;
        while flight.advance_one_tick(&mut TickContext::new(tick, &mut rng, &bus, &bounds)) {
            tick += 1;
        }

        let mut events: Vec<FlightEvent> = Vec::new();
        bus.dispatch(&mut events);
        let charges = events
            .iter()
            .filter(|e| matches!(e, FlightEvent::Detonation(_)))
            .count();
        assert_eq!(charges, 20);
    }
}
