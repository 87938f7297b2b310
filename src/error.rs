//! Error types for the ordering engine.
//!
//! Missing track attributes are never errors; every comparator and model has
//! an explicit fallback. The variants here cover the few inputs the engine
//! genuinely cannot act on.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the ordering engine and its boundary contracts
#[derive(Error, Debug)]
pub enum EngineError {
    /// Curve targets and tracks must pair one-to-one
    #[error("expected {expected} target values, got {actual}")]
    TargetCountMismatch { expected: usize, actual: usize },

    /// Manual relocation addressed a position outside the sequence
    #[error("cannot move track from {from} to {to}: sequence has {len} tracks")]
    MoveOutOfRange { from: usize, to: usize, len: usize },

    /// A criterion name outside `{bpm, key, energy}`
    #[error("unknown criterion: {0}")]
    UnknownCriterion(String),

    /// Playlist hand-off needs a non-blank name
    #[error("playlist name must not be blank")]
    BlankPlaylistName,

    /// The persistence collaborator rejected the hand-off
    #[error("publish failed: {0}")]
    Publish(String),

    /// I/O error from a boundary adapter
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error from a boundary adapter
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
