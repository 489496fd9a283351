#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

use fastrand::Rng;
use glam::{Vec2, Vec3};
use linecharge_common::{FlightId, WorldPos};
use linecharge_physics::prelude::*;
use proptest::prelude::*;

fn continuous_range(speed: f32, gravity: f32, angle: LaunchAngle) -> f32 {
    2.0 * speed * speed * angle.sin * angle.cos / gravity
}

fn run_flight(flight: &mut FlightController, seed: u64) -> Vec<FlightEvent> {
    let mut rng = Rng::with_seed(seed);
    let bus = EventBus::new(8192);
    let mut tick = 0;
    while flight.advance_one_tick(&mut TickContext::new(tick, &mut rng, &bus, &Unbounded)) {
        tick += 1;
        assert!(tick < 20_000, "flight never finished");
    }
    // A few extra ticks must not fire anything again
    for extra in 0..5 {
        assert!(!flight.advance_one_tick(&mut TickContext::new(tick + extra, &mut rng, &bus, &Unbounded)));
    }
    bus.drain()
}

// =============================================================================
// Ballistic solver properties
// =============================================================================

proptest! {
    #[test]
    fn solver_hits_reachable_flat_range(
        speed in 0.2f32..0.6,
        gravity in 0.003f32..0.01,
        reach in 0.05f32..0.95,
    ) {
        let solver = BallisticSolver::default();
        let max_range = max_flat_range(speed, gravity) / DEFAULT_RANGE_CORRECTION;
        let range = max_range * reach;

        let angle = solver.solve(speed, gravity, 0.0, range);
        let landed = continuous_range(speed, gravity, angle);

        prop_assert!(angle.degrees() >= 45.0 - 1e-3);
        prop_assert!(
            (landed - range).abs() <= range * 0.03,
            "range={}, landed={}, angle={}",
            range, landed, angle.degrees()
        );
    }

    #[test]
    fn solver_falls_back_out_of_reach(
        speed in 0.2f32..0.6,
        gravity in 0.003f32..0.01,
        height in 0.0f32..2.0,
        beyond in 1.1f32..10.0,
    ) {
        let solver = BallisticSolver::default();
        // Even the best height bonus cannot reach this far
        let range = (max_flat_range(speed, gravity) + height * 2.0) * beyond;

        let angle = solver.solve(speed, gravity, height, range);
        prop_assert!(angle.sin.is_finite() && angle.cos.is_finite());
        prop_assert!((angle.degrees() - DEFAULT_FALLBACK_ANGLE_DEG).abs() < 1e-3);
    }
}

// =============================================================================
// Rope properties
// =============================================================================

proptest! {
    #[test]
    fn folded_nodes_stay_within_one_segment(
        node_count in 2usize..80,
        length in 0.5f32..40.0,
        anchor_x in -500.0f32..500.0,
        anchor_y in -500.0f32..500.0,
        heading in 0.0f32..std::f32::consts::TAU,
        seed in any::<u64>(),
    ) {
        let mut rope = RopeSimulator::with_defaults(node_count, length, 0.0055)
            .expect("valid rope");
        let anchor = Vec2::new(anchor_x, anchor_y);
        let direction = Vec2::from_angle(heading);
        rope.initialize_folded(anchor, 0.55, direction, &mut Rng::with_seed(seed));

        let max_seg = rope.max_segment_length();
        for node in rope.nodes() {
            let d = node.plane_pos.distance(anchor);
            prop_assert!(d <= max_seg + 1e-3, "node {} from anchor, max {}", d, max_seg);
            prop_assert!((node.height - 0.55).abs() <= 0.01 + 1e-6);
        }
    }

    #[test]
    fn anchors_pinned_after_every_step(
        seed in any::<u64>(),
        end_x in 5.0f32..30.0,
        end_y in -10.0f32..10.0,
        end_height in 0.0f32..5.0,
        ticks in 1usize..60,
    ) {
        let mut rng = Rng::with_seed(seed);
        let mut rope = RopeSimulator::new(40, 25.0, 0.0055, 40, RopeTuning::default())
            .expect("valid rope");
        rope.assign_masses(20, 0.1, 5.0);
        rope.initialize_folded(Vec2::ZERO, 0.55, Vec2::X, &mut rng);

        for tick in 0..ticks {
            let t = (tick + 1) as f32 / ticks as f32;
            let anchors = Anchors {
                start: Vec2::ZERO,
                start_height: 0.55,
                end: Vec2::new(end_x, end_y) * t,
                end_height: end_height * t,
            };
            rope.step(anchors, tick as f32 / 60.0, &mut rng);

            let nodes = rope.nodes();
            prop_assert_eq!(nodes[0].plane_pos, anchors.start);
            prop_assert_eq!(nodes[0].height, anchors.start_height);
            prop_assert_eq!(nodes[39].plane_pos, anchors.end);
            prop_assert_eq!(nodes[39].height, anchors.end_height);
        }
    }

    #[test]
    fn same_seed_same_rope(seed in any::<u64>()) {
        let run = || {
            let mut rng = Rng::with_seed(seed);
            let mut rope = RopeSimulator::with_defaults(30, 12.0, 0.0055).expect("valid rope");
            rope.initialize_folded(Vec2::new(3.0, 4.0), 0.55, Vec2::Y, &mut rng);
            for tick in 0..90 {
                let anchors = Anchors {
                    start: Vec2::new(3.0, 4.0),
                    start_height: 0.55,
                    end: Vec2::new(3.0, 4.0 + tick as f32 * 0.12),
                    end_height: (1.5 - tick as f32 * 0.02).max(0.0),
                };
                rope.step(anchors, tick as f32 / 60.0, &mut rng);
            }
            rope.nodes().to_vec()
        };
        prop_assert_eq!(run(), run());
    }
}

// =============================================================================
// Projectile properties
// =============================================================================

proptest! {
    #[test]
    fn landed_projectile_is_frozen(
        x in -100.0f32..100.0,
        y in -100.0f32..100.0,
        vx in -1.0f32..1.0,
        vz in -1.0f32..0.0,
        landing_tick in 0u64..10_000,
        later in 1u64..500,
    ) {
        let state = ProjectileState {
            position: Vec3::new(x, y, 0.0),
            velocity: Vec3::new(vx, 0.0, vz),
            landed: true,
            landing_tick: Some(landing_tick),
        };
        let mut rocket = ProjectileKinematics::from_state(state, 0.0055);
        for tick in 0..later {
            prop_assert_eq!(rocket.step(landing_tick + tick), StepOutcome::Landed);
        }
        prop_assert_eq!(*rocket.state(), state);
    }

    #[test]
    fn save_restores_projectile_state(
        x in -100.0f32..100.0,
        y in -100.0f32..100.0,
        z in 0.0f32..10.0,
        vx in -1.0f32..1.0,
        vz in -1.0f32..1.0,
        landed in any::<bool>(),
        cached in any::<bool>(),
    ) {
        let state = ProjectileState {
            position: Vec3::new(x, y, z),
            velocity: Vec3::new(vx, 0.0, vz),
            landed,
            landing_tick: landed.then_some(42),
        };
        let anchor = cached.then_some(Vec2::new(x - 0.9, y));
        let save = FlightSaveData::new(&state, anchor);

        let bytes = save.to_bytes().expect("serialize");
        let loaded = FlightSaveData::from_bytes(&bytes).expect("deserialize");
        prop_assert_eq!(loaded.projectile_state(), state);
        prop_assert_eq!(loaded.launcher_anchor(), anchor);
    }
}

// =============================================================================
// Whole-flight properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_charge_detonates_exactly_once(
        distance in 3.0f32..25.0,
        heading in 0.0f32..std::f32::consts::TAU,
        seed in any::<u64>(),
    ) {
        let launcher = WorldPos::on_ground(Vec2::new(50.0, 50.0));
        let target = launcher.plane + Vec2::from_angle(heading) * distance;
        let mut flight = FlightController::new(&launcher, &target, FlightConfig::default())
            .expect("valid flight");

        let events = run_flight(&mut flight, seed);
        let mut indices: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                FlightEvent::Detonation(d) => Some(d.node_index),
                _ => None,
            })
            .collect();
        indices.sort_unstable();

        prop_assert_eq!(indices, (20..40).collect::<Vec<_>>());
        prop_assert_eq!(flight.phase(), FlightPhase::Detonated);
        let teardowns = events
            .iter()
            .filter(|e| matches!(e, FlightEvent::TornDown { .. }))
            .count();
        prop_assert_eq!(teardowns, 1);
    }

    #[test]
    fn flights_are_deterministic(
        distance in 3.0f32..25.0,
        seed in any::<u64>(),
    ) {
        let run = || {
            let mut flight = FlightController::new(
                &Vec2::new(10.0, 10.0),
                &Vec2::new(10.0 + distance, 12.0),
                FlightConfig::default(),
            )
            .expect("valid flight")
            .with_id(FlightId::from_raw(1));
            let events = run_flight(&mut flight, seed);
            (events, flight.rope().map(|r| r.nodes().to_vec()))
        };
        prop_assert_eq!(run(), run());
    }
}
