//! Error types for the line-charge flight core.

use thiserror::Error;

/// Top-level error type for line-charge operations.
#[derive(Debug, Error)]
pub enum LineChargeError {
    /// Flight construction errors
    #[error("Flight error: {0}")]
    Flight(#[from] FlightError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Invalid parameters supplied when creating a flight or a rope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlightError {
    /// A rope needs at least its two anchor nodes
    #[error("rope needs at least 2 nodes, got {count}")]
    InvalidNodeCount {
        /// Requested node count
        count: usize,
    },

    /// Charge segment starts past the end of the rope
    #[error("charge start {charge_start} is beyond node count {node_count}")]
    InvalidChargeStart {
        /// Requested charge start index
        charge_start: usize,
        /// Rope node count
        node_count: usize,
    },

    /// A physical parameter is out of range
    #[error("invalid {name}: {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f32,
    },
}

/// Result type alias for line-charge operations.
pub type LineChargeResult<T> = Result<T, LineChargeError>;
