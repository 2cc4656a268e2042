//! Map command - run one mapper over raw payload lines

use super::{load_catalog, mapper_kind, stage_name};
use crate::io::{event_time_extractor, parse_header, raw_datum, write_envelope};
use crate::CliResult;
use chrono::Utc;
use clap::Args;
use processor::{EventTimeExtractor, Mapper};
use std::path::PathBuf;
use streamfold_config::StreamfoldConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Arguments for `streamfold map`
#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    /// Mapper to run (enrich, flatmap, keying, planner)
    #[arg(long, env = "UDF_NAME", value_name = "NAME")]
    pub udf: Option<String>,

    /// Reference catalog for enrich and flatmap
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Header attached to every input, as name=value
    #[arg(long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Key attached to every input
    #[arg(long = "key", value_name = "KEY")]
    pub keys: Vec<String>,
}

/// Counts reported after a map run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapSummary {
    pub inputs: u64,
    pub outputs: u64,
    pub dropped: u64,
}

impl MapArgs {
    pub async fn execute(&self, config: &StreamfoldConfig) -> CliResult<()> {
        let kind = mapper_kind(&stage_name(self.udf.as_deref(), config)?)?;
        let catalog = load_catalog(kind, self.catalog.as_ref(), config)?;
        let mapper = kind.build(catalog, &config.processor)?;
        let extractor = event_time_extractor(config)?;

        let reader = BufReader::new(tokio::io::stdin());
        let mut writer = tokio::io::stdout();
        let summary = map_lines(
            mapper.as_ref(),
            extractor.as_ref(),
            &self.headers,
            &self.keys,
            reader,
            &mut writer,
        )
        .await?;

        info!(
            mapper = %kind,
            inputs = summary.inputs,
            outputs = summary.outputs,
            dropped = summary.dropped,
            "Map finished"
        );
        Ok(())
    }
}

/// Feed every non-blank line of `reader` to `mapper` and write its envelopes
pub async fn map_lines<R, W>(
    mapper: &dyn Mapper,
    extractor: &dyn EventTimeExtractor,
    headers: &[(String, String)],
    keys: &[String],
    reader: R,
    writer: &mut W,
) -> CliResult<MapSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = MapSummary::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        summary.inputs += 1;

        let mut datum = raw_datum(&line, extractor, Utc::now()).with_keys(keys.iter().cloned());
        for (name, value) in headers {
            datum = datum.with_header(name.clone(), value.clone());
        }

        for envelope in mapper.map(&datum) {
            if envelope.is_dropped() {
                summary.dropped += 1;
            } else {
                summary.outputs += 1;
            }
            write_envelope(writer, &envelope, Some(datum.event_time)).await?;
        }
        debug!(input = summary.inputs, "Mapped input");
    }

    writer.flush().await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_envelope_line;
    use processor::{FieldTimeExtractor, MapperKind, Path, ProcessingTimeExtractor, ProcessorConfig};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_map_keying_lines() {
        let mapper = MapperKind::Keying
            .build(None, &ProcessorConfig::default())
            .unwrap();
        let input = [
            json!({"vehicle_type": "car", "color": "red", "speed": 80}).to_string(),
            String::new(),
            json!({"vehicle_type": "truck"}).to_string(),
        ]
        .join("\n");

        let mut out = Vec::new();
        let summary = map_lines(
            mapper.as_ref(),
            &ProcessingTimeExtractor,
            &[],
            &[],
            input.as_bytes(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(
            summary,
            MapSummary {
                inputs: 2,
                outputs: 1,
                dropped: 1
            }
        );

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let (first, event_time) = parse_envelope_line(lines[0], 1).unwrap();
        assert_eq!(first.keys(), &["car".to_string(), "red".to_string()]);
        assert!(event_time.is_some());

        let (second, _) = parse_envelope_line(lines[1], 2).unwrap();
        assert!(second.is_dropped());
    }

    #[tokio::test]
    async fn test_map_planner_uses_headers() {
        let mapper = MapperKind::Planner
            .build(None, &ProcessorConfig::default())
            .unwrap();
        let input = json!({"animals": ["tiger"]}).to_string();
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let extractor = FieldTimeExtractor::new(Path::parse("ts").unwrap());

        let mut out = Vec::new();
        map_lines(
            mapper.as_ref(),
            &extractor,
            &headers,
            &[],
            input.as_bytes(),
            &mut out,
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let first: Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["tags"], json!(["tiger"]));
    }
}
