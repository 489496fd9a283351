//! Flight controller tying the rocket, rope, and detonation together.
//!
//! A flight is driven by an external scheduler calling
//! [`FlightController::advance_one_tick`] once per simulation tick. The launch
//! is solved and the rope laid out lazily on the first tick. After the rocket
//! lands the rope keeps settling; once the detonation delay has passed every
//! charge node in bounds produces one detonation event and the flight ends.

use fastrand::Rng;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use linecharge_common::{flat_heading_degrees, FlightError, FlightId, GridCell, WorldPos};

use crate::ballistics::LaunchSpec;
use crate::config::FlightConfig;
use crate::events::{DetonationEvent, EventBus, FlightEvent, TeardownReason};
use crate::geometry::{GroundPoint, MapBounds};
use crate::projectile::{ProjectileKinematics, StepOutcome};
use crate::rope::{Anchors, RopeSimulator};
use crate::save::FlightSaveData;

/// Radius around the launcher inside which rope still counts as stowed.
pub const STOWED_RADIUS: f32 = 0.6;

/// Lifecycle phase of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FlightPhase {
    /// Created, launch not solved yet
    #[default]
    Uninitialized,
    /// Rocket airborne
    Flying,
    /// Rocket touched the ground this tick
    Landed,
    /// Waiting for the detonation delay
    Settling,
    /// Charges went off (terminal)
    Detonated,
    /// Removed without detonating (terminal)
    Aborted,
}

impl FlightPhase {
    /// Whether the flight has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Detonated | Self::Aborted)
    }
}

/// Per-tick context handed in by the scheduler.
pub struct TickContext<'a> {
    /// Current simulation tick
    pub tick: u64,
    /// Shared random source
    pub rng: &'a mut Rng,
    /// Where events go
    pub events: &'a EventBus,
    /// Map extent for detonation cells
    pub bounds: &'a dyn MapBounds,
}

impl<'a> TickContext<'a> {
    /// Creates a tick context.
    #[must_use]
    pub fn new(tick: u64, rng: &'a mut Rng, events: &'a EventBus, bounds: &'a dyn MapBounds) -> Self {
        Self {
            tick,
            rng,
            events,
            bounds,
        }
    }

    /// Simulation clock in seconds.
    #[must_use]
    pub fn seconds(&self, ticks_per_second: f32) -> f32 {
        (self.tick as f64 / f64::from(ticks_per_second)) as f32
    }
}

/// One line-charge flight.
#[derive(Debug, Clone)]
pub struct FlightController {
    id: FlightId,
    config: FlightConfig,
    origin: WorldPos,
    destination: WorldPos,
    launch: Option<LaunchSpec>,
    projectile: Option<ProjectileKinematics>,
    rope: Option<RopeSimulator>,
    launcher_anchor: Option<Vec2>,
    phase: FlightPhase,
    dropped_detonations: usize,
}

impl FlightController {
    /// Creates a flight from a launcher toward a target.
    ///
    /// The launch starts at the launcher's plane position at the configured
    /// launcher height and aims at the target's plane position on the ground.
    pub fn new<L, T>(launcher: &L, target: &T, config: FlightConfig) -> Result<Self, FlightError>
    where
        L: GroundPoint + ?Sized,
        T: GroundPoint + ?Sized,
    {
        let mut config = config;
        config.validate();
        config.check()?;

        let origin = WorldPos::new(launcher.plane_position(), config.launcher_height);
        let destination = WorldPos::on_ground(target.plane_position());
        let id = FlightId::new();

        debug!(
            %id,
            distance = origin.horizontal_distance(destination),
            "created line-charge flight"
        );

        Ok(Self {
            id,
            config,
            origin,
            destination,
            launch: None,
            projectile: None,
            rope: None,
            launcher_anchor: None,
            phase: FlightPhase::Uninitialized,
            dropped_detonations: 0,
        })
    }

    /// Recreates a flight from saved state.
    ///
    /// The rocket resumes exactly where it was saved. The rope is laid out
    /// again at the launcher on the next tick.
    pub fn restore<L, T>(
        launcher: &L,
        target: &T,
        config: FlightConfig,
        save: &FlightSaveData,
    ) -> Result<Self, FlightError>
    where
        L: GroundPoint + ?Sized,
        T: GroundPoint + ?Sized,
    {
        let mut flight = Self::new(launcher, target, config)?;
        flight.projectile = Some(ProjectileKinematics::from_state(
            save.projectile_state(),
            flight.config.gravity,
        ));
        flight.launcher_anchor = save.launcher_anchor();

        info!(id = %flight.id, landed = save.landed, "restored line-charge flight");
        Ok(flight)
    }

    /// Replaces the generated flight ID.
    #[must_use]
    pub fn with_id(mut self, id: FlightId) -> Self {
        self.id = id;
        self
    }

    /// Solves the launch and builds the rope and rocket if not done yet.
    ///
    /// Calling it again after the first time does nothing.
    pub fn initialize(&mut self, ctx: &mut TickContext<'_>) {
        if self.phase.is_terminal() {
            return;
        }

        let launch = match self.launch {
            Some(launch) => launch,
            None => {
                let solver = self.config.solver();
                let mut launch = LaunchSpec::solve(
                    &solver,
                    self.origin,
                    self.destination,
                    self.config.launch_speed,
                    self.config.gravity,
                    self.config.launcher_setback,
                );
                if let Some(anchor) = self.launcher_anchor {
                    launch = launch.with_anchor(anchor, &solver);
                }
                self.launch = Some(launch);
                self.launcher_anchor = Some(launch.launcher_anchor);

                info!(
                    id = %self.id,
                    elevation = launch.angle.degrees(),
                    range = launch.range,
                    "launch solved"
                );
                ctx.events.publish(FlightEvent::Launched {
                    flight_id: self.id,
                    elevation_degrees: launch.angle.degrees(),
                    heading_degrees: launch.heading_degrees(),
                });
                launch
            },
        };

        if self.projectile.is_none() {
            self.projectile = Some(ProjectileKinematics::launch(&launch));
        }

        if self.rope.is_none() {
            self.rope = self.build_rope(&launch, ctx.rng);
        }

        if self.phase == FlightPhase::Uninitialized {
            let landed = self.projectile.as_ref().is_some_and(ProjectileKinematics::is_landed);
            self.phase = if landed {
                FlightPhase::Settling
            } else {
                FlightPhase::Flying
            };
        }
    }

    fn build_rope(&self, launch: &LaunchSpec, rng: &mut Rng) -> Option<RopeSimulator> {
        let config = &self.config;
        let total_length = launch.total_distance * config.rope_length_factor;

        match RopeSimulator::new(
            config.node_count,
            total_length,
            config.gravity,
            config.solver_iterations,
            config.rope,
        ) {
            Ok(mut rope) => {
                rope.assign_masses(config.charge_start, config.light_mass, config.heavy_mass);
                rope.initialize_folded(
                    launch.launcher_anchor,
                    config.launcher_height,
                    launch.direction,
                    rng,
                );
                Some(rope)
            },
            Err(e) => {
                warn!(id = %self.id, "failed to build rope: {e}");
                None
            },
        }
    }

    /// Advances the flight by one tick.
    ///
    /// Returns whether the flight is still active.
    pub fn advance_one_tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        if self.phase.is_terminal() {
            return false;
        }

        self.initialize(ctx);

        let (Some(launch), Some(projectile)) = (self.launch, self.projectile.as_mut()) else {
            self.finish(ctx.events, TeardownReason::MissingRope);
            return false;
        };

        if projectile.is_landed() {
            let landing_tick = projectile.landing_tick().unwrap_or(ctx.tick);
            if ctx.tick >= landing_tick.saturating_add(self.config.detonation_delay_ticks) {
                self.detonate(ctx);
                return self.is_active();
            }
            if ctx.tick > landing_tick {
                self.phase = FlightPhase::Settling;
            }
        } else {
            let outcome = projectile.step(ctx.tick);

            if projectile.is_boosting(launch.origin.plane, launch.total_distance, self.config.boost_fraction) {
                ctx.events.publish(FlightEvent::BoostPhase {
                    flight_id: self.id,
                    position: projectile.position(),
                    velocity: projectile.velocity(),
                });
            }

            if outcome == StepOutcome::JustLanded {
                let cell = projectile.ground_cell();
                self.phase = FlightPhase::Landed;
                info!(id = %self.id, tick = ctx.tick, %cell, "rocket landed");
                ctx.events.publish(FlightEvent::Landed {
                    flight_id: self.id,
                    tick: ctx.tick,
                    cell,
                });
            }
        }

        let rocket = projectile.position();
        let time = ctx.seconds(self.config.ticks_per_second);
        if let Some(rope) = self.rope.as_mut() {
            rope.step(
                Anchors {
                    start: launch.launcher_anchor,
                    start_height: self.config.launcher_height,
                    end: rocket.plane,
                    end_height: rocket.height,
                },
                time,
                ctx.rng,
            );
        }

        true
    }

    /// Detonates every in-bounds charge node and ends the flight.
    ///
    /// Returns the number of detonation events actually delivered. A flight
    /// without a rope is torn down without detonating. Calling this on a
    /// finished flight does nothing.
    ///
    /// When the bus could hold every charge but is too full right now, the
    /// detonation is deferred and the flight stays active; the next tick
    /// retries. Charges that can never fit are counted in
    /// [`FlightController::dropped_detonations`].
    pub fn detonate(&mut self, ctx: &mut TickContext<'_>) -> usize {
        if self.phase.is_terminal() {
            return 0;
        }

        let Some(rope) = self.rope.as_ref() else {
            warn!(id = %self.id, "detonation requested without a rope");
            self.finish(ctx.events, TeardownReason::MissingRope);
            return 0;
        };

        let charges: Vec<(usize, GridCell)> = rope
            .charge_nodes(self.config.charge_start)
            .filter_map(|(node_index, node)| {
                let cell = node.ground_cell();
                if ctx.bounds.contains(cell) {
                    Some((node_index, cell))
                } else {
                    debug!(id = %self.id, node_index, %cell, "charge out of bounds, skipped");
                    None
                }
            })
            .collect();

        // Every charge plus the teardown event
        let needed = charges.len() + 1;
        let free = ctx.events.free_capacity();
        if needed > free && needed <= ctx.events.capacity() {
            debug!(id = %self.id, needed, free, "event bus busy, detonation deferred");
            return 0;
        }

        let direction_degrees = flat_heading_degrees(self.origin.plane, self.destination.plane);
        let mut delivered = 0;
        let mut dropped = 0;

        for (node_index, cell) in charges {
            let sent = ctx.events.publish(FlightEvent::Detonation(DetonationEvent {
                flight_id: self.id,
                node_index,
                cell,
                radius: self.config.explosion_radius,
                damage_kind: self.config.damage_kind.clone(),
                direction_degrees,
            }));
            if sent {
                delivered += 1;
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            warn!(
                id = %self.id,
                dropped,
                capacity = ctx.events.capacity(),
                "event bus too small for the charge segment"
            );
        }
        self.dropped_detonations = dropped;

        info!(id = %self.id, tick = ctx.tick, charges = delivered, "line charge detonated");
        self.finish(ctx.events, TeardownReason::Detonated);
        delivered
    }

    /// Removes the flight without detonating.
    pub fn tear_down(&mut self, events: &EventBus) {
        if self.phase.is_terminal() {
            return;
        }
        self.finish(events, TeardownReason::Cancelled);
    }

    fn finish(&mut self, events: &EventBus, reason: TeardownReason) {
        self.phase = match reason {
            TeardownReason::Detonated => FlightPhase::Detonated,
            TeardownReason::MissingRope | TeardownReason::Cancelled => FlightPhase::Aborted,
        };
        debug!(id = %self.id, ?reason, "flight torn down");
        events.publish(FlightEvent::TornDown {
            flight_id: self.id,
            reason,
        });
    }

    /// State needed to resume this flight, once the rocket exists.
    #[must_use]
    pub fn save_data(&self) -> Option<FlightSaveData> {
        self.projectile
            .as_ref()
            .map(|p| FlightSaveData::new(p.state(), self.launcher_anchor))
    }

    /// Charges whose detonation events could not be delivered.
    #[must_use]
    pub const fn dropped_detonations(&self) -> usize {
        self.dropped_detonations
    }

    /// Flight ID.
    #[must_use]
    pub const fn id(&self) -> FlightId {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> FlightPhase {
        self.phase
    }

    /// Whether the flight still needs ticks.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.phase.is_terminal()
    }

    /// Effective configuration (after validation).
    #[must_use]
    pub const fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Launch point.
    #[must_use]
    pub const fn origin(&self) -> WorldPos {
        self.origin
    }

    /// Aim point.
    #[must_use]
    pub const fn destination(&self) -> WorldPos {
        self.destination
    }

    /// Solved launch, once initialized.
    #[must_use]
    pub const fn launch_spec(&self) -> Option<&LaunchSpec> {
        self.launch.as_ref()
    }

    /// Rocket kinematics, once initialized or restored.
    #[must_use]
    pub const fn projectile(&self) -> Option<&ProjectileKinematics> {
        self.projectile.as_ref()
    }

    /// Rope, once initialized.
    #[must_use]
    pub const fn rope(&self) -> Option<&RopeSimulator> {
        self.rope.as_ref()
    }

    /// Launcher anchor, once computed or restored.
    #[must_use]
    pub const fn launcher_anchor(&self) -> Option<Vec2> {
        self.launcher_anchor
    }

    /// Map cell under the rocket (the launcher's cell before launch).
    #[must_use]
    pub fn ground_cell(&self) -> GridCell {
        self.projectile
            .as_ref()
            .map_or_else(|| self.origin.ground_cell(), ProjectileKinematics::ground_cell)
    }

    /// Flat heading of the rocket in degrees.
    #[must_use]
    pub fn heading_degrees(&self) -> f32 {
        let launch_heading = flat_heading_degrees(self.origin.plane, self.destination.plane);
        self.projectile
            .as_ref()
            .map_or(launch_heading, |p| p.heading_degrees(launch_heading))
    }

    /// Whether the rocket motor has burned out.
    #[must_use]
    pub fn is_burned_out(&self) -> bool {
        match (&self.projectile, &self.launch) {
            (Some(p), Some(launch)) => {
                p.is_burned_out(launch.origin.plane, launch.total_distance, self.config.boost_fraction)
            },
            _ => false,
        }
    }

    /// First rope node that has left the launcher (0 before the rope exists).
    #[must_use]
    pub fn deployed_start_index(&self) -> usize {
        match (&self.rope, self.launcher_anchor) {
            (Some(rope), Some(anchor)) => rope.deployed_start_index(anchor, STOWED_RADIUS),
            _ => 0,
        }
    }
}
