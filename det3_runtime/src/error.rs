//! Runtime error types.

use std::io;

use thiserror::Error;

use det3_engine::invariants::InvariantViolation;

pub type BenchResult<T> = Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Length prefix out of bounds or frame cut short.
    #[error("Corrupt trace frame: {0}")]
    CorruptFrame(String),

    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Trace log cycles must be consecutive, starting at 1.
    #[error("Sequence violation in trace store: expected cycle {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// All possible snapshot codec failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("SerializationError: {0}")]
    Serialization(String),

    /// Malformed JSON, missing or unknown fields.
    #[error("DeserializationError: {0}")]
    Deserialization(String),

    /// Stored hash does not match the stored state.
    #[error("HashMismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("InvariantViolation: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}
