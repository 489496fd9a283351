//! ID types for flights.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for flight IDs.
static FLIGHT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one line-charge flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlightId(u64);

impl FlightId {
    /// Creates a new unique flight ID.
    #[must_use]
    pub fn new() -> Self {
        Self(FLIGHT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a flight ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid flight ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) flight ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for FlightId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FlightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "flight#{}", self.0)
    }
}
