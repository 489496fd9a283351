//! Verlet rope between a fixed launcher and a moving projectile.
//!
//! The rope is a chain of point masses with a maximum distance between
//! neighbours. Each tick:
//! 1. interior nodes integrate from their previous positions (Verlet) with
//!    drag, gravity, and a small lateral turbulence,
//! 2. both end nodes are pinned to their anchors,
//! 3. distance constraints are relaxed a fixed number of times, re-pinning the
//!    anchors after every pass,
//! 4. nodes that reached the ground are clamped, scattered sideways if they
//!    hit hard, and slowed by ground friction.
//!
//! Heavier nodes move less when a constraint is corrected, so the charge
//! segment drags the light lead cable rather than the other way round.

use fastrand::Rng;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use linecharge_common::{FlightError, GridCell};

/// Constraint passes used when none are specified.
pub const DEFAULT_SOLVER_ITERATIONS: usize = 30;

/// Integration constants for the rope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RopeTuning {
    /// Velocity retained per tick while airborne
    pub drag_air: f32,
    /// Velocity retained per tick on the ground
    pub drag_ground: f32,
    /// Height at or below which a node counts as grounded
    pub ground_threshold: f32,
    /// Previous height above which a grounding node counts as a hard landing
    pub impact_threshold: f32,
    /// Scale of the sideways scatter on a hard landing
    pub scatter_strength: f32,
    /// Share of the scatter carried into the previous position (impulse)
    pub scatter_carry: f32,
    /// Peak lateral turbulence per tick (0 disables)
    pub turbulence_amplitude: f32,
    /// Turbulence angular frequency, radians per second
    pub turbulence_frequency: f32,
    /// Turbulence phase offset between neighbouring nodes
    pub turbulence_phase_step: f32,
    /// Minimum height for turbulence to act
    pub turbulence_min_height: f32,
    /// Half-range of the random height jitter in the folded layout
    pub fold_jitter: f32,
}

impl Default for RopeTuning {
    fn default() -> Self {
        Self {
            drag_air: 0.985,
            drag_ground: 0.60,
            ground_threshold: 0.01,
            impact_threshold: 0.05,
            scatter_strength: 1.5,
            scatter_carry: 0.5,
            turbulence_amplitude: 0.003,
            turbulence_frequency: 3.0,
            turbulence_phase_step: 0.4,
            turbulence_min_height: 0.1,
            fold_jitter: 0.01,
        }
    }
}

impl RopeTuning {
    /// Clamps values to sensible ranges.
    pub fn validate(&mut self) {
        self.drag_air = self.drag_air.clamp(0.0, 1.0);
        self.drag_ground = self.drag_ground.clamp(0.0, 1.0);
        self.ground_threshold = self.ground_threshold.max(0.0);
        self.impact_threshold = self.impact_threshold.max(self.ground_threshold);
        self.scatter_strength = self.scatter_strength.max(0.0);
        self.scatter_carry = self.scatter_carry.clamp(0.0, 1.0);
        self.turbulence_amplitude = self.turbulence_amplitude.max(0.0);
        self.fold_jitter = self.fold_jitter.max(0.0);
    }
}

/// One point mass of the rope.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RopeNode {
    /// Position on the horizontal plane
    pub plane_pos: Vec2,
    /// Height above ground
    pub height: f32,
    /// Plane position one tick ago
    pub prev_plane_pos: Vec2,
    /// Height one tick ago
    pub prev_height: f32,
    /// Weight used when splitting constraint corrections
    pub mass: f32,
}

impl RopeNode {
    /// Straight-line distance to another node, height included.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let d_plane = other.plane_pos - self.plane_pos;
        let d_height = other.height - self.height;
        (d_plane.length_squared() + d_height * d_height).sqrt()
    }

    /// Map cell under the node.
    #[must_use]
    pub fn ground_cell(&self) -> GridCell {
        GridCell::from_plane(self.plane_pos)
    }
}

/// Rope endpoints for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    /// Launcher-side plane position
    pub start: Vec2,
    /// Launcher-side height
    pub start_height: f32,
    /// Projectile-side plane position
    pub end: Vec2,
    /// Projectile-side height
    pub end_height: f32,
}

/// Constrained multi-node rope.
#[derive(Debug, Clone)]
pub struct RopeSimulator {
    nodes: Box<[RopeNode]>,
    max_segment_length: f32,
    gravity: f32,
    solver_iterations: usize,
    lateral_axis: Vec2,
    tuning: RopeTuning,
}

impl RopeSimulator {
    /// Creates a rope of `node_count` nodes spanning `total_length` when taut.
    ///
    /// Nodes start at the origin with unit mass; call
    /// [`RopeSimulator::initialize_folded`] to lay them out.
    pub fn new(
        node_count: usize,
        total_length: f32,
        gravity: f32,
        solver_iterations: usize,
        tuning: RopeTuning,
    ) -> Result<Self, FlightError> {
        if node_count < 2 {
            return Err(FlightError::InvalidNodeCount { count: node_count });
        }
        if !(total_length >= 0.0) || !total_length.is_finite() {
            return Err(FlightError::InvalidParameter {
                name: "total_length",
                value: total_length,
            });
        }

        let nodes = vec![
            RopeNode {
                mass: 1.0,
                ..RopeNode::default()
            };
            node_count
        ];

        Ok(Self {
            nodes: nodes.into_boxed_slice(),
            max_segment_length: total_length / (node_count - 1) as f32,
            gravity,
            solver_iterations,
            lateral_axis: Vec2::Y,
            tuning,
        })
    }

    /// Creates a rope with the default solver iteration count and tuning.
    pub fn with_defaults(node_count: usize, total_length: f32, gravity: f32) -> Result<Self, FlightError> {
        Self::new(
            node_count,
            total_length,
            gravity,
            DEFAULT_SOLVER_ITERATIONS,
            RopeTuning::default(),
        )
    }

    /// Assigns `light` mass below `charge_start` and `heavy` mass from it on.
    pub fn assign_masses(&mut self, charge_start: usize, light: f32, heavy: f32) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.mass = if i >= charge_start { heavy } else { light };
        }
    }

    /// Lays the rope out as a tight zig-zag coil at the anchor.
    ///
    /// Nodes alternate sides of the launch direction and step backwards every
    /// second node. Heights get a small random jitter so no two nodes coincide.
    pub fn initialize_folded(&mut self, anchor: Vec2, anchor_height: f32, direction: Vec2, rng: &mut Rng) {
        let forward = direction.try_normalize().unwrap_or(Vec2::X);
        let lateral = forward.perp();
        self.lateral_axis = lateral;

        let max_seg = self.max_segment_length;
        let pairs = ((self.nodes.len() - 1) / 2).max(1) as f32;
        let safe_width = 0.2_f32.min(max_seg * 0.4);
        let safe_back = 0.02_f32.min(max_seg * 0.1).min(max_seg * 0.5 / pairs);
        let jitter = self.tuning.fold_jitter;

        for (i, node) in self.nodes.iter_mut().enumerate() {
            let jitter_h = (rng.f32() * 2.0 - 1.0) * jitter;
            let side_sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let back_off = (i / 2) as f32 * safe_back;

            node.plane_pos = anchor + lateral * (safe_width * side_sign) - forward * back_off;
            node.prev_plane_pos = node.plane_pos;
            node.height = anchor_height + jitter_h;
            node.prev_height = node.height;
        }

        trace!(
            nodes = self.nodes.len(),
            max_segment_length = max_seg,
            "rope folded at anchor"
        );
    }

    /// Advances the rope one tick.
    ///
    /// `time` is the simulation clock in seconds, used by the turbulence wave.
    pub fn step(&mut self, anchors: Anchors, time: f32, rng: &mut Rng) {
        self.integrate(time);
        self.pin(anchors);

        for _ in 0..self.solver_iterations {
            self.relax_constraints();
            self.pin(anchors);
        }

        self.collide_ground(rng);
    }

    fn integrate(&mut self, time: f32) {
        let tuning = self.tuning;
        let lateral = self.lateral_axis;
        let gravity = self.gravity;
        let last = self.nodes.len() - 1;

        for i in 1..last {
            let node = &mut self.nodes[i];
            let drag = if node.height <= tuning.ground_threshold {
                tuning.drag_ground
            } else {
                tuning.drag_air
            };

            let mut vel_plane = (node.plane_pos - node.prev_plane_pos) * drag;
            let vel_height = (node.height - node.prev_height) * drag;

            if node.height > tuning.turbulence_min_height {
                let wave = (time * tuning.turbulence_frequency + i as f32 * tuning.turbulence_phase_step).sin()
                    * tuning.turbulence_amplitude;
                vel_plane += lateral * wave;
            }

            node.prev_plane_pos = node.plane_pos;
            node.prev_height = node.height;

            node.plane_pos += vel_plane;
            node.height += vel_height - gravity;
        }
    }

    fn pin(&mut self, anchors: Anchors) {
        let last = self.nodes.len() - 1;

        self.nodes[0].plane_pos = anchors.start;
        self.nodes[0].height = anchors.start_height;
        self.nodes[last].plane_pos = anchors.end;
        self.nodes[last].height = anchors.end_height;
    }

    fn relax_constraints(&mut self) {
        let last = self.nodes.len() - 1;
        let max_seg = self.max_segment_length;

        for i in 0..last {
            let (a, b) = (self.nodes[i], self.nodes[i + 1]);
            let d_plane = b.plane_pos - a.plane_pos;
            let d_height = b.height - a.height;
            let dist = (d_plane.length_squared() + d_height * d_height).sqrt();

            if dist <= max_seg {
                continue;
            }

            let diff = (dist - max_seg) / dist;
            let total_mass = a.mass + b.mass;
            let (share_a, share_b) = if total_mass > f32::EPSILON {
                (b.mass / total_mass, a.mass / total_mass)
            } else {
                (0.5, 0.5)
            };

            let push_plane = d_plane * diff;
            let push_height = d_height * diff;

            if i != 0 {
                self.nodes[i].plane_pos += push_plane * share_a;
                self.nodes[i].height += push_height * share_a;
            }
            if i + 1 != last {
                self.nodes[i + 1].plane_pos -= push_plane * share_b;
                self.nodes[i + 1].height -= push_height * share_b;
            }
        }
    }

    fn collide_ground(&mut self, rng: &mut Rng) {
        let tuning = self.tuning;
        let lateral = self.lateral_axis;
        let last = self.nodes.len() - 1;

        for node in &mut self.nodes[1..last] {
            if node.height > tuning.ground_threshold {
                continue;
            }

            if node.prev_height > tuning.impact_threshold {
                // Slapping down: vertical speed turns into sideways splay
                let vertical_speed = node.prev_height - node.height;
                let scatter = (rng.f32() * 2.0 - 1.0) * tuning.scatter_strength * vertical_speed;
                node.plane_pos += lateral * scatter;
                node.prev_plane_pos += lateral * scatter * tuning.scatter_carry;
            }

            node.height = 0.0;
            node.prev_height = 0.0;

            let vel = node.plane_pos - node.prev_plane_pos;
            node.prev_plane_pos = node.plane_pos - vel * tuning.drag_ground;
        }
    }

    /// Number of nodes, anchors included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Read-only view of all nodes.
    #[must_use]
    pub fn nodes(&self) -> &[RopeNode] {
        &self.nodes
    }

    /// Maximum allowed distance between neighbours.
    #[must_use]
    pub const fn max_segment_length(&self) -> f32 {
        self.max_segment_length
    }

    /// Unit axis perpendicular to the launch direction.
    #[must_use]
    pub const fn lateral_axis(&self) -> Vec2 {
        self.lateral_axis
    }

    /// Constraint passes per tick.
    #[must_use]
    pub const fn solver_iterations(&self) -> usize {
        self.solver_iterations
    }

    /// Nodes of the explosive segment, with their indices.
    pub fn charge_nodes(&self, charge_start: usize) -> impl Iterator<Item = (usize, &RopeNode)> + '_ {
        self.nodes.iter().enumerate().skip(charge_start)
    }

    /// Distances between each pair of neighbours.
    pub fn segment_lengths(&self) -> impl Iterator<Item = f32> + '_ {
        self.nodes.windows(2).map(|pair| pair[0].distance(&pair[1]))
    }

    /// Index of the first node that has left the launcher.
    ///
    /// Scans from the projectile end for the last node still within `radius`
    /// of `launcher`; everything after it has been paid out.
    #[must_use]
    pub fn deployed_start_index(&self, launcher: Vec2, radius: f32) -> usize {
        self.nodes
            .iter()
            .rposition(|node| node.plane_pos.distance(launcher) <= radius)
            .map_or(0, |i| i + 1)
    }
}
