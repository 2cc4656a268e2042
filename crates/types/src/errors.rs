//! Error types for envelope handling

use thiserror::Error;

/// Result type alias for envelope operations
pub type Result<T> = std::result::Result<T, EnvelopeError>;

/// Errors raised while decoding envelopes from their wire form
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("dropped envelope must not carry a value")]
    DroppedWithValue,

    #[error("envelope carries both a JSON value and a text value")]
    AmbiguousValue,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
