//! Projectile kinematics for the towing rocket.
//!
//! Position and velocity are kept as `Vec3` with the plane in `x`/`y` and the
//! height in `z`. Each tick applies one explicit Euler step under constant
//! gravity; there is no sub-stepping. Once the rocket touches the ground it is
//! frozen for the rest of the flight.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use linecharge_common::{flat_heading_degrees, GridCell, WorldPos};

use crate::ballistics::LaunchSpec;

/// Horizontal travel below which boost progress is undefined.
const MIN_BOOST_DISTANCE: f32 = 0.001;

/// Horizontal speed below which the heading falls back to the launch heading.
const MIN_HEADING_SPEED: f32 = 0.001;

/// Flight phase of the rocket itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectilePhase {
    /// Airborne and integrating
    #[default]
    Flying,
    /// On the ground, frozen
    Landed,
}

/// Outcome of a single kinematics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still airborne
    Flying,
    /// Touched the ground during this step
    JustLanded,
    /// Already on the ground; nothing moved
    Landed,
}

/// Snapshot of the rocket's physical state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Plane position in `x`/`y`, height in `z`
    pub position: Vec3,
    /// Plane velocity in `x`/`y`, vertical velocity in `z`
    pub velocity: Vec3,
    /// Whether the rocket has touched the ground
    pub landed: bool,
    /// Tick of ground contact
    pub landing_tick: Option<u64>,
}

/// Euler-integrated rocket.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileKinematics {
    state: ProjectileState,
    gravity: f32,
}

impl ProjectileKinematics {
    /// Creates a rocket at `start` moving along `direction` at the given
    /// elevation.
    #[must_use]
    pub fn new(start: WorldPos, direction: Vec2, speed: f32, sin: f32, cos: f32, gravity: f32) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec2::X);
        let flat = direction * speed * cos;
        Self {
            state: ProjectileState {
                position: start.to_vec3(),
                velocity: Vec3::new(flat.x, flat.y, speed * sin),
                landed: false,
                landing_tick: None,
            },
            gravity,
        }
    }

    /// Creates the rocket for a solved launch, starting at the launcher anchor.
    #[must_use]
    pub fn launch(spec: &LaunchSpec) -> Self {
        Self::new(
            WorldPos::new(spec.launcher_anchor, spec.origin.height),
            spec.direction,
            spec.launch_speed,
            spec.angle.sin,
            spec.angle.cos,
            spec.gravity,
        )
    }

    /// Rebuilds kinematics from a saved state.
    #[must_use]
    pub fn from_state(state: ProjectileState, gravity: f32) -> Self {
        let mut state = state;
        if state.landed {
            state.position.z = 0.0;
        }
        Self { state, gravity }
    }

    /// Advances one tick.
    ///
    /// `tick` is recorded as the landing tick if ground contact happens now.
    pub fn step(&mut self, tick: u64) -> StepOutcome {
        if self.state.landed {
            return StepOutcome::Landed;
        }

        self.state.velocity.z -= self.gravity;
        self.state.position += self.state.velocity;

        if self.state.position.z <= 0.0 {
            self.state.position.z = 0.0;
            self.state.landed = true;
            self.state.landing_tick = Some(tick);
            return StepOutcome::JustLanded;
        }
        StepOutcome::Flying
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ProjectilePhase {
        if self.state.landed {
            ProjectilePhase::Landed
        } else {
            ProjectilePhase::Flying
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub const fn state(&self) -> &ProjectileState {
        &self.state
    }

    /// Current position as plane + height.
    #[must_use]
    pub fn position(&self) -> WorldPos {
        WorldPos::from_vec3(self.state.position)
    }

    /// Current velocity (`z` is vertical).
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    /// Whether the rocket has landed.
    #[must_use]
    pub const fn is_landed(&self) -> bool {
        self.state.landed
    }

    /// Tick of ground contact, if any.
    #[must_use]
    pub const fn landing_tick(&self) -> Option<u64> {
        self.state.landing_tick
    }

    /// Map cell under the rocket.
    #[must_use]
    pub fn ground_cell(&self) -> GridCell {
        self.position().ground_cell()
    }

    /// Fraction of the total horizontal distance covered from `origin`.
    ///
    /// Returns `None` when the total distance is too small to measure.
    #[must_use]
    pub fn travel_fraction(&self, origin: Vec2, total_distance: f32) -> Option<f32> {
        if total_distance <= MIN_BOOST_DISTANCE {
            return None;
        }
        Some(self.position().plane.distance(origin) / total_distance)
    }

    /// Whether the rocket is airborne and still inside the boost fraction.
    #[must_use]
    pub fn is_boosting(&self, origin: Vec2, total_distance: f32, boost_fraction: f32) -> bool {
        !self.state.landed
            && self
                .travel_fraction(origin, total_distance)
                .is_some_and(|fraction| fraction <= boost_fraction)
    }

    /// Whether the motor has burned out (past the boost fraction or landed).
    #[must_use]
    pub fn is_burned_out(&self, origin: Vec2, total_distance: f32, boost_fraction: f32) -> bool {
        self.state.landed
            || self
                .travel_fraction(origin, total_distance)
                .is_some_and(|fraction| fraction > boost_fraction)
    }

    /// Flat heading of the rocket in degrees.
    ///
    /// While flying the heading follows the horizontal velocity; once landed
    /// or horizontally still it uses `launch_heading`.
    #[must_use]
    pub fn heading_degrees(&self, launch_heading: f32) -> f32 {
        let flat = Vec2::new(self.state.velocity.x, self.state.velocity.y);
        if self.state.landed || flat.length() <= MIN_HEADING_SPEED {
            return launch_heading;
        }
        flat_heading_degrees(Vec2::ZERO, flat)
    }
}
