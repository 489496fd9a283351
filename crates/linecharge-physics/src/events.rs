//! Event bus from flights to external effect and explosion systems.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use linecharge_common::{FlightId, GridCell, WorldPos};

/// Why a flight was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeardownReason {
    /// Charges went off normally
    Detonated,
    /// Detonation was requested before the rope existed
    MissingRope,
    /// The host removed the flight
    Cancelled,
}

/// One explosion along the charge segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetonationEvent {
    /// Flight that produced the explosion
    pub flight_id: FlightId,
    /// Rope node the charge sits on
    pub node_index: usize,
    /// Ground cell to explode at
    pub cell: GridCell,
    /// Explosion radius in tiles
    pub radius: f32,
    /// Damage type name
    pub damage_kind: String,
    /// Flat heading of the launch, for directional debris
    pub direction_degrees: f32,
}

/// Event types published by flights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlightEvent {
    /// Launch solved and rope laid out
    Launched {
        /// Flight ID
        flight_id: FlightId,
        /// Solved elevation in degrees
        elevation_degrees: f32,
        /// Flat heading in degrees
        heading_degrees: f32,
    },
    /// Rocket still under boost (exhaust trail)
    BoostPhase {
        /// Flight ID
        flight_id: FlightId,
        /// Rocket position
        position: WorldPos,
        /// Rocket velocity (`z` is vertical)
        velocity: Vec3,
    },
    /// Rocket touched the ground
    Landed {
        /// Flight ID
        flight_id: FlightId,
        /// Tick of ground contact
        tick: u64,
        /// Cell under the rocket
        cell: GridCell,
    },
    /// A charge node exploded
    Detonation(DetonationEvent),
    /// Flight removed
    TornDown {
        /// Flight ID
        flight_id: FlightId,
        /// Why it was removed
        reason: TeardownReason,
    },
}

impl FlightEvent {
    /// Flight the event belongs to.
    #[must_use]
    pub fn flight_id(&self) -> FlightId {
        match self {
            Self::Launched { flight_id, .. }
            | Self::BoostPhase { flight_id, .. }
            | Self::Landed { flight_id, .. }
            | Self::TornDown { flight_id, .. } => *flight_id,
            Self::Detonation(event) => event.flight_id,
        }
    }
}

/// Event bus for broadcasting flight events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<FlightEvent>,
    /// Receiver for collecting events
    receiver: Receiver<FlightEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    ///
    /// Never blocks. Returns `false` and logs a warning if the event was
    /// dropped because the bus is full.
    pub fn publish(&self, event: FlightEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                warn!(capacity = self.capacity, "event bus full, dropping {:?}", err.into_inner());
                false
            },
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<FlightEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns how many more events fit before publishing starts dropping.
    #[must_use]
    pub fn free_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.receiver.len())
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<FlightEvent> {
        self.sender.clone()
    }
}

/// Typed event handler trait.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &FlightEvent);
}

impl EventHandler for Vec<FlightEvent> {
    fn handle(&mut self, event: &FlightEvent) {
        self.push(event.clone());
    }
}

impl EventBus {
    /// Drains pending events into a handler, returning how many were handled.
    pub fn dispatch<H: EventHandler + ?Sized>(&self, handler: &mut H) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            handler.handle(&event);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teardown(id: u64) -> FlightEvent {
        FlightEvent::TornDown {
            flight_id: FlightId::from_raw(id),
            reason: TeardownReason::Cancelled,
        }
    }

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        assert!(bus.publish(teardown(1)));
        assert!(bus.publish(teardown(2)));
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].flight_id(), FlightId::from_raw(1));
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        assert!(bus.publish(teardown(1)));
        assert!(!bus.publish(teardown(2)));
        assert_eq!(bus.free_capacity(), 0);
        assert_eq!(bus.drain().len(), 1);
        assert_eq!(bus.free_capacity(), 1);
    }

    #[test]
    fn test_dispatch_to_handler() {
        let bus = EventBus::default();
        let sender = bus.sender();
        sender.try_send(teardown(3)).expect("send");
        bus.publish(teardown(4));

        let mut seen: Vec<FlightEvent> = Vec::new();
        assert_eq!(bus.dispatch(&mut seen), 2);
        assert_eq!(seen[1].flight_id(), FlightId::from_raw(4));
    }

    #[test]
    fn test_detonation_event_id() {
        let event = FlightEvent::Detonation(DetonationEvent {
            flight_id: FlightId::from_raw(9),
            node_index: 25,
            cell: GridCell::new(4, 5),
            radius: 2.9,
            damage_kind: "Bomb".to_string(),
            direction_degrees: 90.0,
        });
        assert_eq!(event.flight_id(), FlightId::from_raw(9));
    }
}
