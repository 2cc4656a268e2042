//! Reduce command - run one reducer over a single window
//!
//! Input is the JSON lines `map` prints, or raw payloads with `--raw`. The
//! whole of stdin is treated as the contents of one (keys, window) group.

use super::{reducer_kind, stage_name};
use crate::io::{event_time_extractor, parse_envelope_line, parse_time, raw_datum, write_envelope};
use crate::CliResult;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use futures::StreamExt;
use processor::{EventTimeExtractor, ProcessorError, Record, Reducer, WindowBounds, WindowError};
use std::sync::Arc;
use streamfold_config::StreamfoldConfig;
use streamfold_types::{Datum, Envelope};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Arguments for `streamfold reduce`
#[derive(Args, Debug, Clone)]
pub struct ReduceArgs {
    /// Reducer to run (aggr, category-aggr, average)
    #[arg(long, env = "UDF_NAME", value_name = "NAME")]
    pub udf: Option<String>,

    /// Group keys
    #[arg(long = "key", value_name = "KEY")]
    pub keys: Vec<String>,

    /// Window start, RFC3339 or epoch millis
    #[arg(long, value_parser = parse_time)]
    pub start: DateTime<Utc>,

    /// Window end; defaults to start plus the configured window size
    #[arg(long, value_parser = parse_time)]
    pub end: Option<DateTime<Utc>>,

    /// Treat input lines as raw payloads instead of envelopes
    #[arg(long)]
    pub raw: bool,
}

/// How input lines are turned into reducer datums
#[derive(Debug)]
pub struct ReduceInput<'a> {
    pub keys: Vec<String>,
    pub window: WindowBounds,
    pub raw: bool,
    pub extractor: &'a dyn EventTimeExtractor,
    pub channel_buffer: usize,
}

impl ReduceArgs {
    pub async fn execute(&self, config: &StreamfoldConfig) -> CliResult<()> {
        let kind = reducer_kind(&stage_name(self.udf.as_deref(), config)?)?;
        let size = config.processor.runner.window_size();
        let window = window_bounds(self.start, self.end, size)?;
        let extractor = event_time_extractor(config)?;

        let input = ReduceInput {
            keys: self.keys.clone(),
            window,
            raw: self.raw,
            extractor: extractor.as_ref(),
            channel_buffer: config.processor.runner.channel_buffer,
        };

        let reader = BufReader::new(tokio::io::stdin());
        let mut writer = tokio::io::stdout();
        let outputs = reduce_lines(kind.build(), &input, reader, &mut writer).await?;

        info!(
            reducer = %kind,
            window = %window,
            outputs = outputs.iter().filter(|e| !e.is_dropped()).count(),
            "Reduce finished"
        );
        Ok(())
    }
}

/// Window from explicit bounds, or from `start` plus the configured size
pub fn window_bounds(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    size: Duration,
) -> CliResult<WindowBounds> {
    let end = match end {
        Some(end) => end,
        None => start
            .checked_add_signed(size)
            .ok_or_else(|| WindowError::InvalidTimestamp {
                timestamp: start.timestamp_millis(),
                reason: "window end is out of range".to_string(),
            })
            .map_err(ProcessorError::from)?,
    };
    Ok(WindowBounds::try_new(start, end).map_err(ProcessorError::from)?)
}

/// Stream the lines of `reader` into one reducer invocation and write its output
pub async fn reduce_lines<R, W>(
    reducer: Arc<dyn Reducer>,
    input: &ReduceInput<'_>,
    reader: R,
    writer: &mut W,
) -> CliResult<Vec<Envelope>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, rx) = mpsc::channel(input.channel_buffer.max(1));
    let keys = input.keys.clone();
    let window = input.window;
    let task = tokio::spawn(async move {
        reducer
            .reduce(keys, window, ReceiverStream::new(rx).boxed())
            .await
    });

    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut skipped = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let datum = match to_datum(&line, line_no, input) {
            Ok(Some(datum)) => datum,
            Ok(None) => {
                debug!(line = line_no, "Skipping drop sentinel");
                continue;
            }
            Err(e) => {
                skipped += 1;
                warn!(line = line_no, error = %e, "Skipping undecodable input line");
                continue;
            }
        };
        if tx.send(datum).await.is_err() {
            break;
        }
    }
    drop(tx);

    if skipped > 0 {
        warn!(skipped, window = %window, "Some input lines were skipped");
    }

    let outputs = task
        .await
        .map_err(|e| ProcessorError::Execution { source: Box::new(e) })?;

    for envelope in &outputs {
        write_envelope(writer, envelope, None).await?;
    }
    writer.flush().await?;
    Ok(outputs)
}

// Event time: the envelope's own, then the configured field, then the window start.
fn to_datum(line: &str, line_no: usize, input: &ReduceInput<'_>) -> CliResult<Option<Datum>> {
    let fallback = input.window.start;

    if input.raw {
        let datum =
            raw_datum(line, input.extractor, fallback).with_keys(input.keys.iter().cloned());
        return Ok(Some(datum));
    }

    let (envelope, event_time) = parse_envelope_line(line, line_no)?;
    let event_time = match event_time {
        Some(time) => time,
        None => Record::parse(envelope.value())
            .ok()
            .and_then(|record| input.extractor.extract_event_time(&record))
            .unwrap_or(fallback),
    };

    // The drop sentinel yields `None`.
    Ok(Datum::from_envelope(envelope, event_time))
}
