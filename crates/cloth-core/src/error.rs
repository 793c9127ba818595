//! Error types for the cloth simulator.
//!
//! Every fallible operation returns `ClothResult<T>`.

use thiserror::Error;

use crate::simulator::SimulationState;

/// Unified error type for the cloth simulator.
#[derive(Debug, Error)]
pub enum ClothError {
    /// A configuration value is out of range (grid size, spacing, mass, ...).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A grid coordinate, particle index or constraint index is out of range.
    #[error("{what} index {index} out of range (len: {len})")]
    Index {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A saved simulation file is malformed or internally inconsistent.
    #[error("invalid simulation file: {0}")]
    Format(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation is not valid in the simulator's current lifecycle state.
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SimulationState,
    },
}

impl ClothError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ClothError::Configuration(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ClothError::Format(msg.into())
    }
}

/// Convenience alias for `Result<T, ClothError>`.
pub type ClothResult<T> = Result<T, ClothError>;
