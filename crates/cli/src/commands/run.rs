//! Run command - map, window and reduce a finite batch in one process

use super::{load_catalog, mapper_kind, reducer_kind};
use crate::io::{event_time_extractor, parse_header, raw_datum, write_envelope};
use crate::CliResult;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use processor::{EventTimeExtractor, LocalPipeline, PipelineOutput, RunnerConfig};
use std::path::PathBuf;
use streamfold_config::StreamfoldConfig;
use streamfold_types::Datum;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Arguments for `streamfold run`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Mapper stage
    #[arg(long, value_name = "NAME")]
    pub mapper: String,

    /// Reducer stage
    #[arg(long, value_name = "NAME")]
    pub reducer: String,

    /// Tumbling window size in seconds; overrides processor.runner.window_size_ms
    #[arg(long, value_name = "SECS")]
    pub window_secs: Option<u64>,

    /// Reference catalog for enrich and flatmap
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Header attached to every input, as name=value
    #[arg(long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Suppress the summary on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &StreamfoldConfig) -> CliResult<()> {
        let mapper_kind = mapper_kind(&self.mapper)?;
        let reducer_kind = reducer_kind(&self.reducer)?;
        let catalog = load_catalog(mapper_kind, self.catalog.as_ref(), config)?;

        let runner = RunnerConfig {
            window_size_ms: self
                .window_secs
                .map(|secs| secs.saturating_mul(1000))
                .unwrap_or(config.processor.runner.window_size_ms),
            ..config.processor.runner.clone()
        };
        let pipeline = LocalPipeline::new(
            mapper_kind.build(catalog, &config.processor)?,
            reducer_kind.build(),
            &runner,
        )?;

        let extractor = event_time_extractor(config)?;
        let datums = read_datums(
            BufReader::new(tokio::io::stdin()),
            extractor.as_ref(),
            &self.headers,
        )
        .await?;

        let output = pipeline.run(datums).await?;
        write_output(&output, &mut tokio::io::stdout()).await?;

        if !self.quiet {
            print_summary(&output);
        }
        Ok(())
    }
}

/// Read every non-blank line as a raw input
pub async fn read_datums<R>(
    reader: R,
    extractor: &dyn EventTimeExtractor,
    headers: &[(String, String)],
) -> CliResult<Vec<Datum>>
where
    R: AsyncBufRead + Unpin,
{
    let mut datums = Vec::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let mut datum = raw_datum(&line, extractor, Utc::now());
        for (name, value) in headers {
            datum = datum.with_header(name.clone(), value.clone());
        }
        datums.push(datum);
    }

    Ok(datums)
}

/// Write the reducer outputs in window order
pub async fn write_output<W>(output: &PipelineOutput, writer: &mut W) -> CliResult<()>
where
    W: AsyncWrite + Unpin,
{
    for window in &output.windows {
        for envelope in window.envelopes.iter().filter(|e| !e.is_dropped()) {
            write_envelope(writer, envelope, Some(window.window.bounds.start)).await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

fn print_summary(output: &PipelineOutput) {
    let stats = &output.stats;
    eprintln!("{}", "Pipeline summary".bold().cyan());
    eprintln!("  {:<10} {}", "inputs".dimmed(), stats.inputs);
    eprintln!("  {:<10} {}", "mapped".dimmed(), stats.mapped.to_string().green());
    eprintln!("  {:<10} {}", "dropped".dimmed(), stats.dropped.to_string().yellow());
    eprintln!("  {:<10} {}", "windows".dimmed(), stats.windows);
    eprintln!("  {:<10} {}", "outputs".dimmed(), stats.outputs.to_string().green());
}
