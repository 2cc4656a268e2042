//! Local pipeline execution
//!
//! Wires a mapper and a reducer together the way the streaming runtime does,
//! for the CLI and for tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use processor::config::RunnerConfig;
//! use processor::mapper::VehicleKeyer;
//! use processor::pipeline::LocalPipeline;
//! use processor::reducer::{AverageSpeed, WindowReducer};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pipeline = LocalPipeline::new(
//!     Arc::new(VehicleKeyer::new()),
//!     Arc::new(WindowReducer::<AverageSpeed>::new()),
//!     &RunnerConfig::default(),
//! )?;
//! let output = pipeline.run(Vec::new()).await?;
//! assert_eq!(output.stats.windows, 0);
//! # Ok(())
//! # }
//! ```

pub mod runner;

pub use runner::{LocalPipeline, PipelineOutput, RunnerStats, WindowOutput};
