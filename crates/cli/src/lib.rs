//! streamfold command-line interface
//!
//! Runs the mapper and reducer stages over JSON lines on stdin, outside the
//! streaming runtime.

pub mod commands;
pub mod io;

use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] streamfold_config::ConfigError),

    #[error("{0}")]
    Processor(#[from] processor::ProcessorError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] processor::CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input on line {line}: {reason}")]
    InvalidInput { line: usize, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// CLI result type
pub type CliResult<T> = std::result::Result<T, CliError>;
