//! Closed-form launch angle solver.
//!
//! Finds the elevation that carries a fixed-speed projectile over a horizontal
//! range from a raised launch point, under constant per-tick gravity. The range
//! is pre-scaled by a small correction factor because the projectile is later
//! integrated with explicit Euler steps, which drift from the continuous arc.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use linecharge_common::{flat_heading_degrees, WorldPos};

/// Default range scale compensating Euler integration drift.
pub const DEFAULT_RANGE_CORRECTION: f32 = 1.015;

/// Default elevation used when the target is out of reach.
pub const DEFAULT_FALLBACK_ANGLE_DEG: f32 = 45.0;

/// An elevation angle stored as its sine and cosine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchAngle {
    /// Sine of the elevation
    pub sin: f32,
    /// Cosine of the elevation
    pub cos: f32,
}

impl LaunchAngle {
    /// Creates a launch angle from radians.
    #[must_use]
    pub fn from_radians(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { sin, cos }
    }

    /// Creates a launch angle from degrees.
    #[must_use]
    pub fn from_degrees(degrees: f32) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// Elevation in radians.
    #[must_use]
    pub fn radians(&self) -> f32 {
        self.sin.atan2(self.cos)
    }

    /// Elevation in degrees.
    #[must_use]
    pub fn degrees(&self) -> f32 {
        self.radians().to_degrees()
    }
}

/// Analytic high-arc solver with an unreachable-target fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallisticSolver {
    /// Multiplier applied to the requested range before solving
    pub range_correction: f32,
    /// Elevation in degrees used when no solution exists
    pub fallback_angle_deg: f32,
}

impl Default for BallisticSolver {
    fn default() -> Self {
        Self {
            range_correction: DEFAULT_RANGE_CORRECTION,
            fallback_angle_deg: DEFAULT_FALLBACK_ANGLE_DEG,
        }
    }
}

impl BallisticSolver {
    /// Creates a solver with custom tuning.
    #[must_use]
    pub const fn new(range_correction: f32, fallback_angle_deg: f32) -> Self {
        Self {
            range_correction,
            fallback_angle_deg,
        }
    }

    /// Solves for the launch angle, falling back when out of reach.
    ///
    /// # Arguments
    /// * `speed` - Launch speed per tick
    /// * `gravity` - Downward acceleration per tick
    /// * `height` - Launch height above the landing plane
    /// * `range` - Horizontal distance to cover
    #[must_use]
    pub fn solve(&self, speed: f32, gravity: f32, height: f32, range: f32) -> LaunchAngle {
        match self.solve_high_arc(speed, gravity, height, range) {
            Some(radians) => LaunchAngle::from_radians(radians),
            None => LaunchAngle::from_degrees(self.fallback_angle_deg),
        }
    }

    /// Returns the lofted (high) root in radians, or `None` when the corrected
    /// range cannot be reached.
    #[must_use]
    pub fn solve_high_arc(&self, speed: f32, gravity: f32, height: f32, range: f32) -> Option<f32> {
        if !(speed > 0.0 && gravity > 0.0) || !height.is_finite() || !range.is_finite() {
            return None;
        }

        let range = range.abs() * self.range_correction;
        let v2 = speed * speed;
        let g_range = gravity * range;
        let discriminant = v2 * v2 - gravity * (gravity * range * range + 2.0 * height * v2);

        if discriminant < 0.0 {
            return None;
        }
        if g_range <= f32::EPSILON {
            // Target directly below the launch point.
            return Some(FRAC_PI_2);
        }

        let tan_theta = (v2 + discriminant.sqrt()) / g_range;
        Some(tan_theta.atan())
    }
}

/// Farthest flat-ground range for a speed and gravity (45° in continuous time).
#[must_use]
pub fn max_flat_range(speed: f32, gravity: f32) -> f32 {
    if gravity <= 0.0 {
        return f32::INFINITY;
    }
    speed * speed / gravity
}

/// Unit horizontal direction from `from` to `to`, +X when they coincide.
#[must_use]
pub fn flat_direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).try_normalize().unwrap_or(Vec2::X)
}

/// Launch parameters computed once per flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Launch point (height = launcher height)
    pub origin: WorldPos,
    /// Aim point on the ground
    pub destination: WorldPos,
    /// Launch speed per tick
    pub launch_speed: f32,
    /// Gravity per tick
    pub gravity: f32,
    /// Solved elevation
    pub angle: LaunchAngle,
    /// Unit horizontal launch direction
    pub direction: Vec2,
    /// Fixed rope end and projectile start, set back behind the origin
    pub launcher_anchor: Vec2,
    /// Horizontal origin-to-destination distance
    pub total_distance: f32,
    /// Horizontal anchor-to-destination distance fed to the solver
    pub range: f32,
}

impl LaunchSpec {
    /// Solves the launch for the given geometry.
    ///
    /// `launcher_setback` moves the anchor back along the launch direction so
    /// the projectile starts behind the launcher's origin point.
    #[must_use]
    pub fn solve(
        solver: &BallisticSolver,
        origin: WorldPos,
        destination: WorldPos,
        launch_speed: f32,
        gravity: f32,
        launcher_setback: f32,
    ) -> Self {
        let direction = flat_direction(origin.plane, destination.plane);
        let launcher_anchor = origin.plane - direction * launcher_setback;
        let range = destination.plane.distance(launcher_anchor);
        let angle = solver.solve(launch_speed, gravity, origin.height, range);

        Self {
            origin,
            destination: WorldPos::on_ground(destination.plane),
            launch_speed,
            gravity,
            angle,
            direction,
            launcher_anchor,
            total_distance: origin.horizontal_distance(destination),
            range,
        }
    }

    /// Re-aims from a previously cached anchor (restored flights).
    #[must_use]
    pub fn with_anchor(mut self, launcher_anchor: Vec2, solver: &BallisticSolver) -> Self {
        self.launcher_anchor = launcher_anchor;
        self.range = self.destination.plane.distance(launcher_anchor);
        self.angle = solver.solve(self.launch_speed, self.gravity, self.origin.height, self.range);
        self
    }

    /// Initial velocity with the height component in `z`.
    #[must_use]
    pub fn initial_velocity(&self) -> Vec3 {
        let flat = self.direction * self.launch_speed * self.angle.cos;
        Vec3::new(flat.x, flat.y, self.launch_speed * self.angle.sin)
    }

    /// Flat heading of the launch, in degrees.
    #[must_use]
    pub fn heading_degrees(&self) -> f32 {
        flat_heading_degrees(self.origin.plane, self.destination.plane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat-ground landing distance of a continuous (exact) trajectory.
    fn continuous_range(speed: f32, gravity: f32, angle: LaunchAngle) -> f32 {
        2.0 * speed * speed * angle.sin * angle.cos / gravity
    }

    #[test]
    fn test_solver_prefers_high_arc() {
        let solver = BallisticSolver::default();
        let angle = solver.solve(0.4, 0.0055, 0.0, 10.0);
        assert!(angle.degrees() > 45.0);
    }

    #[test]
    fn test_solver_hits_range_on_flat_ground() {
        let solver = BallisticSolver::new(1.0, 45.0);
        let (v, g) = (0.4, 0.0055);
        for range in [2.0, 8.0, 15.0, 25.0] {
            let angle = solver.solve(v, g, 0.0, range);
            let landed = continuous_range(v, g, angle);
            assert!(
                (landed - range).abs() < range * 0.01,
                "range {range}: landed at {landed}"
            );
        }
    }

    #[test]
    fn test_correction_scales_range() {
        let solver = BallisticSolver::default();
        let (v, g) = (0.4, 0.0055);
        let angle = solver.solve(v, g, 0.0, 20.0);
        let landed = continuous_range(v, g, angle);
        assert!((landed - 20.0 * DEFAULT_RANGE_CORRECTION).abs() < 0.05);
    }

    #[test]
    fn test_unreachable_falls_back() {
        let solver = BallisticSolver::default();
        let angle = solver.solve(0.4, 0.0055, 0.0, 1000.0);
        assert!((angle.degrees() - 45.0).abs() < 1e-4);
        assert!(solver.solve_high_arc(0.4, 0.0055, 0.0, 1000.0).is_none());
    }

    #[test]
    fn test_degenerate_inputs_do_not_produce_nan() {
        let solver = BallisticSolver::default();
        for angle in [
            solver.solve(0.0, 0.0055, 0.55, 10.0),
            solver.solve(0.4, 0.0, 0.55, 10.0),
            solver.solve(0.4, 0.0055, 0.55, 0.0),
            solver.solve(0.4, 0.0055, 0.0, f32::NAN),
        ] {
            assert!(angle.sin.is_finite() && angle.cos.is_finite());
        }
        let straight_up = solver.solve(0.4, 0.0055, 0.55, 0.0);
        assert!((straight_up.degrees() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_launch_height_lowers_elevation() {
        let solver = BallisticSolver::default();
        let flat = solver.solve(0.4, 0.0055, 0.0, 10.0);
        let raised = solver.solve(0.4, 0.0055, 2.0, 10.0);
        // A raised launch needs less loft on the high arc to reach the same range
        assert!(raised.degrees() < flat.degrees());
    }

    #[test]
    fn test_launch_spec_geometry() {
        let solver = BallisticSolver::default();
        let origin = WorldPos::new(Vec2::new(10.0, 10.0), 0.55);
        let destination = WorldPos::on_ground(Vec2::new(30.0, 10.0));
        let spec = LaunchSpec::solve(&solver, origin, destination, 0.4, 0.0055, 0.9);

        assert_eq!(spec.direction, Vec2::X);
        assert!((spec.launcher_anchor - Vec2::new(9.1, 10.0)).length() < 1e-5);
        assert!((spec.total_distance - 20.0).abs() < 1e-5);
        assert!((spec.range - 20.9).abs() < 1e-4);

        let vel = spec.initial_velocity();
        assert!((vel.length() - 0.4).abs() < 1e-5);
        assert!(vel.y.abs() < 1e-6);
        assert!(vel.z > vel.x);
    }

    #[test]
    fn test_launch_spec_degenerate_direction() {
        let solver = BallisticSolver::default();
        let origin = WorldPos::new(Vec2::new(5.0, 5.0), 0.55);
        let spec = LaunchSpec::solve(&solver, origin, WorldPos::on_ground(origin.plane), 0.4, 0.0055, 0.9);
        assert_eq!(spec.direction, Vec2::X);
        assert!(spec.initial_velocity().is_finite());
    }
}
