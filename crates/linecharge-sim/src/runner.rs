//! Tick loop that drives one flight and streams its events.
//!
//! Output is JSON lines: a header naming the stream version, then one line per
//! event tagged with the tick it was published on.

use fastrand::Rng;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info};

use linecharge_common::{LineChargeError, LineChargeResult, SchemaVersion};
use linecharge_physics::{
    EventBus, FlightController, FlightEvent, FlightPhase, FlightSaveData, RectBounds, TeardownReason,
    TickContext,
};

use crate::config::SimConfig;

/// First line of the event stream.
#[derive(Debug, Serialize)]
struct StreamHeader {
    schema: String,
    seed: u64,
}

/// One event line.
#[derive(Debug, Serialize)]
struct EventLine<'a> {
    tick: u64,
    event: &'a FlightEvent,
}

/// Summary of a finished (or stopped) run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Ticks advanced
    pub ticks: u64,
    /// Whether the flight ended before the tick limit
    pub finished: bool,
    /// Solved elevation, if the launch happened in this run
    pub elevation_degrees: Option<f32>,
    /// Ticks that published a boost event
    pub boost_ticks: u64,
    /// Tick of ground contact, if seen in this run
    pub landing_tick: Option<u64>,
    /// Detonation events published
    pub detonations: usize,
    /// Why the flight ended
    pub teardown: Option<TeardownReason>,
    /// Total events published
    pub events: usize,
}

impl RunReport {
    fn record(&mut self, event: &FlightEvent) {
        self.events += 1;
        match event {
            FlightEvent::Launched {
                elevation_degrees, ..
            } => self.elevation_degrees = Some(*elevation_degrees),
            FlightEvent::BoostPhase { .. } => self.boost_ticks += 1,
            FlightEvent::Landed { tick, .. } => self.landing_tick = Some(*tick),
            FlightEvent::Detonation(_) => self.detonations += 1,
            FlightEvent::TornDown { reason, .. } => self.teardown = Some(*reason),
        }
    }
}

/// Runs one scenario flight.
pub struct ScenarioRunner {
    config: SimConfig,
    flight: FlightController,
    rng: Rng,
    bus: EventBus,
    bounds: RectBounds,
    tick: u64,
}

impl ScenarioRunner {
    /// Creates a runner for a fresh flight.
    pub fn new(config: SimConfig) -> LineChargeResult<Self> {
        let flight = FlightController::new(&config.launcher, &config.target, config.flight.clone())?;
        Ok(Self::with_flight(config, flight, 0))
    }

    /// Creates a runner that resumes a saved flight at `start_tick`.
    pub fn resume(config: SimConfig, save: &FlightSaveData, start_tick: u64) -> LineChargeResult<Self> {
        let flight = FlightController::restore(&config.launcher, &config.target, config.flight.clone(), save)?;
        Ok(Self::with_flight(config, flight, start_tick))
    }

    fn with_flight(config: SimConfig, flight: FlightController, start_tick: u64) -> Self {
        Self {
            rng: Rng::with_seed(config.seed),
            bus: EventBus::new(config.event_capacity),
            bounds: config.bounds(),
            flight,
            config,
            tick: start_tick,
        }
    }

    /// Advances until the flight ends or the tick limit is reached, writing
    /// events to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> LineChargeResult<RunReport> {
        let mut report = RunReport::default();
        let header = StreamHeader {
            schema: SchemaVersion::EVENT_STREAM.to_string(),
            seed: self.config.seed,
        };
        write_line(out, &header)?;

        while report.ticks < self.config.max_ticks {
            let mut ctx = TickContext::new(self.tick, &mut self.rng, &self.bus, &self.bounds);
            let active = self.flight.advance_one_tick(&mut ctx);

            for event in self.bus.drain() {
                write_line(
                    out,
                    &EventLine {
                        tick: self.tick,
                        event: &event,
                    },
                )?;
                report.record(&event);
            }

            report.ticks += 1;
            self.tick += 1;
            if !active {
                report.finished = true;
                break;
            }
        }

        if !report.finished {
            debug!(tick = self.tick, "tick limit reached with flight active");
        }
        info!(
            ticks = report.ticks,
            detonations = report.detonations,
            finished = report.finished,
            "run complete"
        );
        Ok(report)
    }

    /// Save data for the flight as it stands.
    #[must_use]
    pub fn save_data(&self) -> Option<FlightSaveData> {
        self.flight.save_data()
    }

    /// Next tick to run.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current flight phase.
    #[must_use]
    pub const fn phase(&self) -> FlightPhase {
        self.flight.phase()
    }
}

fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> LineChargeResult<()> {
    serde_json::to_writer(&mut *out, value).map_err(|e| LineChargeError::Serialization(e.to_string()))?;
    out.write_all(b"\n")?;
    Ok(())
}
