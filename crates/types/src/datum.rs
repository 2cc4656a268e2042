//! Input datum delivered by the runtime to a stage

use crate::envelope::Envelope;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One input element handed to a mapper or reducer
///
/// Carries the raw payload together with the routing keys, headers and the
/// time metadata the runtime attaches to every message.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    /// Keys assigned upstream (empty for source messages)
    pub keys: Vec<String>,
    /// Raw payload bytes
    pub value: Vec<u8>,
    /// Message headers
    pub headers: HashMap<String, String>,
    /// Timestamp when the event occurred
    pub event_time: DateTime<Utc>,
    /// Watermark observed by the runtime when the datum was delivered
    pub watermark: DateTime<Utc>,
}

impl Datum {
    /// Create a datum with no keys or headers; the watermark starts at the event time
    pub fn new(value: impl Into<Vec<u8>>, event_time: DateTime<Utc>) -> Self {
        Self {
            keys: Vec::new(),
            value: value.into(),
            headers: HashMap::new(),
            event_time,
            watermark: event_time,
        }
    }

    /// Build a reducer input from a mapper output; the drop sentinel yields `None`
    pub fn from_envelope(envelope: Envelope, event_time: DateTime<Utc>) -> Option<Self> {
        if envelope.is_dropped() {
            return None;
        }
        let keys = envelope.keys().to_vec();
        Some(Self::new(envelope.into_value(), event_time).with_keys(keys))
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_watermark(mut self, watermark: DateTime<Utc>) -> Self {
        self.watermark = watermark;
        self
    }

    /// Look up a header, ignoring ASCII case of the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datum_builder() {
        let time = Utc.timestamp_millis_opt(1_000).unwrap();
        let datum = Datum::new("payload", time)
            .with_keys(["a", "b"])
            .with_header("Content-Type", "application/json");

        assert_eq!(datum.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(datum.watermark, time);
        assert_eq!(datum.header("content-type"), Some("application/json"));
        assert_eq!(datum.header("x-missing"), None);
    }

    #[test]
    fn test_from_envelope_skips_drop() {
        let time = Utc::now();
        assert!(Datum::from_envelope(Envelope::drop_message(), time).is_none());

        let datum = Datum::from_envelope(Envelope::new("v").with_keys(["k"]), time).unwrap();
        assert_eq!(datum.keys, vec!["k".to_string()]);
        assert_eq!(datum.value, b"v");
    }
}
