//! Core types shared by the streamfold mapper and reducer stages
//!
//! This crate holds the transport-agnostic units exchanged with the streaming
//! runtime: the [`Datum`] a stage receives and the [`Envelope`] it returns.

pub mod datum;
pub mod envelope;
pub mod errors;

pub use datum::Datum;
pub use envelope::{Envelope, WireEnvelope};
pub use errors::{EnvelopeError, Result};
