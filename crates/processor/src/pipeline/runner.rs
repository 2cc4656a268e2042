//! In-process stand-in for the streaming runtime
//!
//! Maps every input, assigns mapper outputs to tumbling windows by event
//! time, groups them by window and keys, and runs one reducer invocation per
//! group over a bounded channel. Each channel is closed after its last datum,
//! which is the reducer's end-of-window signal.

use crate::config::RunnerConfig;
use crate::error::{ProcessorError, Result};
use crate::mapper::Mapper;
use crate::reducer::Reducer;
use crate::window::{TumblingWindowAssigner, Window, WindowAssigner, WindowBounds};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use streamfold_types::{Datum, Envelope};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Statistics for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerStats {
    /// Inputs handed to the mapper
    pub inputs: u64,
    /// Non-dropped mapper outputs
    pub mapped: u64,
    /// Drop sentinels returned by the mapper
    pub dropped: u64,
    /// Reducer invocations (one per window and key)
    pub windows: u64,
    /// Non-dropped reducer outputs
    pub outputs: u64,
}

/// Output of one reducer invocation
#[derive(Debug, Clone)]
pub struct WindowOutput {
    pub window: Window,
    pub keys: Vec<String>,
    pub envelopes: Vec<Envelope>,
}

/// Result of a pipeline run, ordered by window then keys
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub windows: Vec<WindowOutput>,
    pub stats: RunnerStats,
}

impl PipelineOutput {
    /// All reducer outputs in window order
    pub fn envelopes(&self) -> impl Iterator<Item = &Envelope> {
        self.windows.iter().flat_map(|w| w.envelopes.iter())
    }
}

/// Mapper followed by a windowed reducer
#[derive(Debug)]
pub struct LocalPipeline {
    mapper: Arc<dyn Mapper>,
    reducer: Arc<dyn Reducer>,
    assigner: TumblingWindowAssigner,
    channel_buffer: usize,
}

impl LocalPipeline {
    pub fn new(
        mapper: Arc<dyn Mapper>,
        reducer: Arc<dyn Reducer>,
        config: &RunnerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let assigner = TumblingWindowAssigner::new(config.window_size())?;

        Ok(Self {
            mapper,
            reducer,
            assigner,
            channel_buffer: config.channel_buffer,
        })
    }

    /// Run the pipeline over a finite batch of inputs
    pub async fn run<I>(&self, inputs: I) -> Result<PipelineOutput>
    where
        I: IntoIterator<Item = Datum>,
    {
        let mut stats = RunnerStats::default();
        let mut groups: BTreeMap<(WindowBounds, Vec<String>), Vec<Datum>> = BTreeMap::new();

        for datum in inputs {
            stats.inputs += 1;

            for envelope in self.mapper.map(&datum) {
                if envelope.is_dropped() {
                    stats.dropped += 1;
                    continue;
                }
                stats.mapped += 1;

                let keys = envelope.keys().to_vec();
                let Some(reduced) = Datum::from_envelope(envelope, datum.event_time) else {
                    continue;
                };
                let reduced = reduced.with_watermark(datum.watermark);

                for window in self.assigner.assign_windows(datum.event_time)? {
                    groups
                        .entry((window.bounds, keys.clone()))
                        .or_default()
                        .push(reduced.clone());
                }
            }
        }

        let mut handles = Vec::with_capacity(groups.len());
        for ((bounds, keys), datums) in groups {
            let (tx, rx) = mpsc::channel(self.channel_buffer);
            let reducer = Arc::clone(&self.reducer);
            let task_keys = keys.clone();

            let handle = tokio::spawn(async move {
                reducer
                    .reduce(task_keys, bounds, ReceiverStream::new(rx).boxed())
                    .await
            });

            debug!(window = %bounds, keys = ?keys, datums = datums.len(), "Feeding window");
            for datum in datums {
                tx.send(datum)
                    .await
                    .map_err(|e| ProcessorError::Execution { source: Box::new(e) })?;
            }
            drop(tx);

            handles.push((Window::new(bounds), keys, handle));
        }

        let mut output = PipelineOutput::default();
        for (window, keys, handle) in handles {
            let envelopes: Vec<Envelope> = handle
                .await
                .map_err(|e| ProcessorError::Execution { source: Box::new(e) })?
                .into_iter()
                .filter(|e| !e.is_dropped())
                .collect();

            stats.windows += 1;
            stats.outputs += envelopes.len() as u64;
            output.windows.push(WindowOutput {
                window,
                keys,
                envelopes,
            });
        }

        info!(
            mapper = self.mapper.name(),
            reducer = self.reducer.name(),
            inputs = stats.inputs,
            mapped = stats.mapped,
            dropped = stats.dropped,
            windows = stats.windows,
            "Pipeline run complete"
        );

        output.stats = stats;
        Ok(output)
    }
}
