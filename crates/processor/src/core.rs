//! Event time extraction
//!
//! The runtime stamps every datum with an event time. When payloads are fed
//! in from outside the runtime (CLI, local pipeline) the time has to be read
//! out of the record itself, which is what these extractors do.

use crate::record::{Path, Record};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::fmt;

/// Trait for extracting event time from a record
///
/// Returns `None` when the record carries no usable timestamp; callers decide
/// the fallback.
pub trait EventTimeExtractor: Send + Sync + fmt::Debug {
    /// Extract the event timestamp from a record
    fn extract_event_time(&self, record: &Record) -> Option<DateTime<Utc>>;
}

/// Reads the event time from a field of the record
///
/// Accepts RFC3339 strings and epoch milliseconds.
#[derive(Debug, Clone)]
pub struct FieldTimeExtractor {
    path: Path,
}

impl FieldTimeExtractor {
    pub fn new(path: Path) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventTimeExtractor for FieldTimeExtractor {
    fn extract_event_time(&self, record: &Record) -> Option<DateTime<Utc>> {
        match record.get(&self.path)? {
            Value::String(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Value::Number(number) => {
                let millis = number
                    .as_i64()
                    .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?;
                Utc.timestamp_millis_opt(millis).single()
            }
            _ => None,
        }
    }
}

/// Processing-time semantics: every record happens "now"
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingTimeExtractor;

impl EventTimeExtractor for ProcessingTimeExtractor {
    fn extract_event_time(&self, _record: &Record) -> Option<DateTime<Utc>> {
        Some(Utc::now())
    }
}
