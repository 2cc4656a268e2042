//! Error types for the stage processor
//!
//! Two families live here. Crate-level errors ([`ProcessorError`] and the
//! per-concern enums it wraps) surface from construction, configuration and
//! execution. [`InputError`] is the per-record taxonomy: it never escapes a
//! stage, it is turned into a drop sentinel or an error-tagged envelope.

use thiserror::Error;

/// Main processor error type
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// Window-related errors
    #[error("window error: {0}")]
    Window(#[from] WindowError),

    /// Reference catalog errors
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Record codec errors
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration errors
    #[error("configuration error: {source}")]
    Configuration {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Execution errors
    #[error("execution error: {source}")]
    Execution {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

}

/// Window bounds and lifecycle errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// Window start is not strictly before its end
    #[error("invalid window bounds: start {start} must be before end {end}")]
    InvalidBounds { start: i64, end: i64 },

    /// Window size is invalid
    #[error("invalid window size: {size}ms, must be greater than 0")]
    InvalidWindowSize { size: u64 },

    /// Timestamp cannot be represented
    #[error("invalid event timestamp: {timestamp}, reason: {reason}")]
    InvalidTimestamp { timestamp: i64, reason: String },

    /// Window group no longer accepts input
    #[error("window already closed: window_id={window_id}")]
    WindowClosed { window_id: String },
}

/// Reference catalog build errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Catalog document is not valid JSON
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalog document has the wrong shape
    #[error("malformed catalog entry '{entity}': {reason}")]
    Malformed { entity: String, reason: String },

    /// Same child listed twice under one entity
    #[error("duplicate child '{child}' under entity '{entity}'")]
    DuplicateChild { entity: String, child: String },

    /// Same entity defined twice
    #[error("duplicate entity '{entity}'")]
    DuplicateEntity { entity: String },
}

/// Record codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Payload is not a parseable record
    #[error("failed to parse record: {0}")]
    Parse(String),

    /// Record could not be encoded
    #[error("failed to serialize record: {0}")]
    Serialize(String),

    /// Path expression is not valid
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Per-record failure taxonomy
///
/// Partial degradation (a line item whose reference is unknown) is not an
/// error: it is logged and zero-valued enrichment is applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Payload failed to parse or lacks a required field
    #[error("malformed input: {reason}")]
    Malformed { reason: String },

    /// Required top-level entity ID is absent from the catalog
    #[error("unresolvable reference: {field}={id}")]
    UnresolvableReference { field: String, id: String },

    /// Input matches no recognized routing case
    #[error("unsupported variant: {variant}")]
    UnsupportedVariant { variant: String },
}

impl InputError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        InputError::Malformed {
            reason: reason.into(),
        }
    }

    pub fn unresolvable(field: impl Into<String>, id: impl Into<String>) -> Self {
        InputError::UnresolvableReference {
            field: field.into(),
            id: id.into(),
        }
    }

    pub fn unsupported(variant: impl Into<String>) -> Self {
        InputError::UnsupportedVariant {
            variant: variant.into(),
        }
    }

    /// Short machine-friendly kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            InputError::Malformed { .. } => "malformed_input",
            InputError::UnresolvableReference { .. } => "unresolvable_reference",
            InputError::UnsupportedVariant { .. } => "unsupported_variant",
        }
    }
}

impl From<CodecError> for InputError {
    fn from(err: CodecError) -> Self {
        InputError::malformed(err.to_string())
    }
}

/// Result type alias for processor operations
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Result type alias for window operations
pub type WindowResult<T> = std::result::Result<T, WindowError>;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result type alias for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;
