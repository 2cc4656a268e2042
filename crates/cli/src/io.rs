//! JSON lines plumbing shared by the commands
//!
//! Raw payloads come in one per line. Envelopes go out one per line in their
//! [`WireEnvelope`] form, which is also what `reduce` reads back.

use crate::{CliError, CliResult};
use chrono::{DateTime, TimeZone, Utc};
use processor::{EventTimeExtractor, FieldTimeExtractor, ProcessingTimeExtractor};
use processor::Record;
use streamfold_config::StreamfoldConfig;
use streamfold_types::{Datum, Envelope, WireEnvelope};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Parse an RFC3339 timestamp or epoch milliseconds
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(millis) = s.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {}", s));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
}

/// Parse a `name=value` or `name: value` header argument
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .or_else(|| s.split_once(':'))
        .ok_or_else(|| format!("header must look like name=value: '{}'", s))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty: '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Event time source configured for raw inputs
pub fn event_time_extractor(config: &StreamfoldConfig) -> CliResult<Box<dyn EventTimeExtractor>> {
    Ok(match config.stage.event_time_path()? {
        Some(path) => Box::new(FieldTimeExtractor::new(path)),
        None => Box::new(ProcessingTimeExtractor),
    })
}

/// Build a datum from one raw payload line
///
/// Payloads that are not JSON, or carry no usable timestamp, get `fallback`.
pub fn raw_datum(
    line: &str,
    extractor: &dyn EventTimeExtractor,
    fallback: DateTime<Utc>,
) -> Datum {
    let event_time = Record::parse(line.as_bytes())
        .ok()
        .and_then(|record| extractor.extract_event_time(&record))
        .unwrap_or(fallback);
    Datum::new(line.as_bytes().to_vec(), event_time)
}

/// Decode one envelope line, returning the envelope and its event time if any
pub fn parse_envelope_line(
    line: &str,
    line_no: usize,
) -> CliResult<(Envelope, Option<DateTime<Utc>>)> {
    let invalid = |reason: String| CliError::InvalidInput {
        line: line_no,
        reason,
    };

    let wire: WireEnvelope = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
    let event_time = wire.event_time;
    let envelope = Envelope::try_from(wire).map_err(|e| invalid(e.to_string()))?;
    Ok((envelope, event_time))
}

/// Write one envelope as a JSON line
pub async fn write_envelope<W>(
    writer: &mut W,
    envelope: &Envelope,
    event_time: Option<DateTime<Utc>>,
) -> CliResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut wire = WireEnvelope::from(envelope);
    if !envelope.is_dropped() {
        wire.event_time = event_time;
    }

    let mut line = serde_json::to_vec(&wire).map_err(std::io::Error::from)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    Ok(())
}
