//! Stage processor for streamfold
//!
//! This crate provides the mapper and reducer stages that plug into the
//! streaming runtime, together with the record codec, the reference catalog
//! they enrich against, and a local pipeline runner.

pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod record;
pub mod reducer;
pub mod window;

// Re-export commonly used types
pub use core::{EventTimeExtractor, FieldTimeExtractor, ProcessingTimeExtractor};

pub use catalog::{Catalog, CatalogEntry, CatalogSchema, ChildEntry};

pub use record::{Path, Record, Segment};

pub use window::{TumblingWindowAssigner, Window, WindowAssigner, WindowBounds};

pub use error::{
    CatalogError, CodecError, InputError, ProcessorError, Result as ProcessorResult,
    WindowError,
};

pub use config::{ProcessorConfig, RouterConfig, RunnerConfig};

pub use mapper::{
    CategorySplitter, ContentRouter, ContentType, FailurePolicy, Mapper, MapperKind,
    OrderEnricher, VehicleKeyer,
};

pub use reducer::{
    AverageSpeed, CategorySales, Micros, Reducer, ReducerKind, RestaurantSales,
    WindowAggregate, WindowGroup, WindowReducer,
};

pub use pipeline::{LocalPipeline, PipelineOutput, RunnerStats};

pub use streamfold_types::{Datum, Envelope};
