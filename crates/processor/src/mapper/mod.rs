//! Mapper stages
//!
//! A mapper is a pure function from one input [`Datum`] to zero or more
//! [`Envelope`]s. Mappers hold nothing but read-only state (an injected
//! `Arc<Catalog>`, routing configuration), so one instance is shared across
//! concurrent invocations.
//!
//! Every mapper follows the same outline: validate the required top-level
//! fields, resolve references against the catalog, then emit either one
//! enriched envelope, one envelope per derived bucket, or one tagged envelope
//! per validated sub-element. Per-record failures never escape `map`; they are
//! turned into an output by the stage's [`FailurePolicy`].

pub mod enrich;
pub mod flatmap;
pub mod keying;
pub mod routing;

pub use enrich::OrderEnricher;
pub use flatmap::CategorySplitter;
pub use keying::VehicleKeyer;
pub use routing::{ContentRouter, ContentType};

use crate::catalog::{Catalog, CatalogSchema};
use crate::config::ProcessorConfig;
use crate::error::{InputError, ProcessorError, Result};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use streamfold_types::{Datum, Envelope};
use tracing::warn;

/// Tag carried by error envelopes
pub const ERROR_TAG: &str = "error";

/// A stateless per-record transform stage
pub trait Mapper: Send + Sync + fmt::Debug {
    /// Stage name, as selected on the command line
    fn name(&self) -> &str;

    /// Transform one input into zero or more envelopes
    fn map(&self, datum: &Datum) -> Vec<Envelope>;
}

/// What a stage emits when an input cannot be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Emit the drop sentinel
    Drop,
    /// Emit `{"error": "<message>"}` tagged [`ERROR_TAG`]
    ErrorTag,
}

impl FailurePolicy {
    /// Turn a per-record failure into the stage's output envelope
    pub fn reject(&self, stage: &str, error: &InputError) -> Envelope {
        self.reject_as(stage, error, &error.to_string())
    }

    /// Like [`FailurePolicy::reject`], with `message` as the error body
    ///
    /// The full error is still logged.
    pub fn reject_as(&self, stage: &str, error: &InputError, message: &str) -> Envelope {
        warn!(
            stage = stage,
            kind = error.kind(),
            error = %error,
            policy = ?self,
            "Rejecting input"
        );

        match self {
            FailurePolicy::Drop => Envelope::drop_message(),
            FailurePolicy::ErrorTag => error_envelope(message),
        }
    }
}

/// Build an error envelope carrying `message`
pub fn error_envelope(message: &str) -> Envelope {
    let body = json!({ "error": message }).to_string();
    Envelope::new(body).with_tag(ERROR_TAG)
}

/// The mapper stages this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapperKind {
    Enrich,
    Flatmap,
    Keying,
    Planner,
}

impl MapperKind {
    pub const ALL: [MapperKind; 4] = [
        MapperKind::Enrich,
        MapperKind::Flatmap,
        MapperKind::Keying,
        MapperKind::Planner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MapperKind::Enrich => "enrich",
            MapperKind::Flatmap => "flatmap",
            MapperKind::Keying => "keying",
            MapperKind::Planner => "planner",
        }
    }

    /// Catalog layout the stage expects, if it needs a catalog at all
    pub fn catalog_schema(&self) -> Option<CatalogSchema> {
        match self {
            MapperKind::Enrich => Some(CatalogSchema::restaurants()),
            MapperKind::Flatmap => Some(CatalogSchema::products()),
            MapperKind::Keying | MapperKind::Planner => None,
        }
    }

    /// Construct the stage
    pub fn build(
        &self,
        catalog: Option<Arc<Catalog>>,
        config: &ProcessorConfig,
    ) -> Result<Arc<dyn Mapper>> {
        let require_catalog = |catalog: Option<Arc<Catalog>>| {
            catalog.ok_or_else(|| ProcessorError::Configuration {
                source: format!("mapper '{}' requires a catalog", self.as_str()).into(),
            })
        };

        let mapper: Arc<dyn Mapper> = match self {
            MapperKind::Enrich => Arc::new(OrderEnricher::new(require_catalog(catalog)?)),
            MapperKind::Flatmap => Arc::new(CategorySplitter::new(require_catalog(catalog)?)),
            MapperKind::Keying => Arc::new(VehicleKeyer::new()),
            MapperKind::Planner => {
                config.router.validate()?;
                Arc::new(ContentRouter::new(config.router.allowed_animals.clone()))
            }
        };
        Ok(mapper)
    }
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapperKind {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enrich" => Ok(MapperKind::Enrich),
            "flatmap" => Ok(MapperKind::Flatmap),
            "keying" | "keying_udf" => Ok(MapperKind::Keying),
            "planner" | "router" => Ok(MapperKind::Planner),
            other => Err(ProcessorError::Configuration {
                source: format!("unknown mapper '{}'", other).into(),
            }),
        }
    }
}
