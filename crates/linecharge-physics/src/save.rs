//! Persistence of resumable flight state.
//!
//! Only what is needed to resume a flight is stored: the rocket's state and
//! the launcher anchor. Rope nodes are not saved; a restored flight lays its
//! rope out again at the anchor and lets it relax toward the rocket.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use linecharge_common::{LineChargeError, MagicBytes, SchemaVersion};

use crate::projectile::ProjectileState;

/// Current flight save format version.
pub const SAVE_VERSION: SchemaVersion = SchemaVersion::FLIGHT_SAVE;

/// Errors that can occur during save/load operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid magic bytes
    #[error("Invalid flight save format")]
    InvalidFormat,

    /// Version mismatch
    #[error("Incompatible save version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: SchemaVersion,
        /// Found version
        found: SchemaVersion,
    },

    /// Save body corrupted
    #[error("Save file corrupted: {0}")]
    Corrupted(String),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

impl From<SaveError> for LineChargeError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Io(e) => Self::Io(e),
            SaveError::VersionMismatch { expected, found } => Self::VersionMismatch {
                expected: expected.to_string(),
                actual: found.to_string(),
            },
            other => Self::Serialization(other.to_string()),
        }
    }
}

/// Saved state of one flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSaveData {
    /// Format version
    pub version: SchemaVersion,
    /// Whether the rocket had landed
    pub landed: bool,
    /// Tick of ground contact
    pub landing_tick: Option<u64>,
    /// Rocket position (`z` is height)
    pub position: Vec3,
    /// Rocket velocity (`z` is vertical)
    pub velocity: Vec3,
    /// Launcher anchor on the plane
    pub launcher_plane_pos: Vec2,
    /// Whether `launcher_plane_pos` holds a computed anchor
    pub launcher_pos_cached: bool,
}

impl FlightSaveData {
    /// Creates save data from a rocket state and an optional cached anchor.
    #[must_use]
    pub fn new(state: &ProjectileState, launcher_anchor: Option<Vec2>) -> Self {
        Self {
            version: SAVE_VERSION,
            landed: state.landed,
            landing_tick: state.landing_tick,
            position: state.position,
            velocity: state.velocity,
            launcher_plane_pos: launcher_anchor.unwrap_or(Vec2::ZERO),
            launcher_pos_cached: launcher_anchor.is_some(),
        }
    }

    /// Rocket state stored in this save.
    #[must_use]
    pub fn projectile_state(&self) -> ProjectileState {
        ProjectileState {
            position: self.position,
            velocity: self.velocity,
            landed: self.landed,
            landing_tick: self.landing_tick,
        }
    }

    /// Cached launcher anchor, if one was stored.
    #[must_use]
    pub fn launcher_anchor(&self) -> Option<Vec2> {
        self.launcher_pos_cached.then_some(self.launcher_plane_pos)
    }

    /// Serializes to binary format.
    pub fn to_bytes(&self) -> SaveResult<Vec<u8>> {
        let mut buffer = Vec::new();

        // Write magic bytes
        buffer.extend_from_slice(&MagicBytes::FLIGHT_SAVE.0);

        // Serialize data
        let data = bincode::serialize(self).map_err(|e| SaveError::Serialization(e.to_string()))?;

        buffer.extend(data);

        Ok(buffer)
    }

    /// Deserializes from binary format.
    pub fn from_bytes(bytes: &[u8]) -> SaveResult<Self> {
        // Check magic bytes
        if !MagicBytes::FLIGHT_SAVE.matches(bytes) {
            return Err(SaveError::InvalidFormat);
        }

        // Deserialize data
        let save: Self = bincode::deserialize(&bytes[MagicBytes::FLIGHT_SAVE.0.len()..])
            .map_err(|e| SaveError::Corrupted(e.to_string()))?;

        // Same major, and no minor additions this build does not know about
        if !SAVE_VERSION.is_compatible_with(&save.version) {
            return Err(SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: save.version,
            });
        }

        Ok(save)
    }

    /// Writes the save to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SaveResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Reads a save from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> SaveResult<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
