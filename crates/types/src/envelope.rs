//! Message envelope exchanged with the streaming runtime

use crate::errors::{EnvelopeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport unit carrying a record plus routing metadata
///
/// An envelope is either a regular message (value, keys, tags) or the drop
/// sentinel. The drop sentinel never carries a value, keys or tags, and the
/// runtime discards it without forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    value: Vec<u8>,
    keys: Vec<String>,
    tags: Vec<String>,
    dropped: bool,
}

impl Envelope {
    /// Create a new envelope carrying `value` with no keys or tags
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            keys: Vec::new(),
            tags: Vec::new(),
            dropped: false,
        }
    }

    /// Create the drop sentinel
    pub fn drop_message() -> Self {
        Self {
            dropped: true,
            ..Default::default()
        }
    }

    /// Replace the partition keys
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.dropped {
            self.keys = keys.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Replace the tags; duplicates are removed keeping first-seen order
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.dropped {
            return self;
        }
        self.tags.clear();
        for tag in tags {
            self.push_tag(tag.into());
        }
        self
    }

    /// Add a single tag if it is not already present
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        if !self.dropped {
            self.push_tag(tag.into());
        }
        self
    }

    fn push_tag(&mut self, tag: String) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Payload bytes (empty for the drop sentinel)
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Consume the envelope and return its payload
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Partition keys; the first key is the primary partition dimension
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Tags used for conditional forwarding
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Check whether a tag is present
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether this envelope is the drop sentinel
    pub fn is_dropped(&self) -> bool {
        self.dropped
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dropped {
            return write!(f, "Envelope(drop)");
        }
        write!(
            f,
            "Envelope {{ keys: {:?}, tags: {:?}, value: {} }}",
            self.keys,
            self.tags,
            String::from_utf8_lossy(&self.value)
        )
    }
}

/// JSON line form of an [`Envelope`]
///
/// Values that are valid JSON are embedded as-is under `value`; anything else
/// is carried as lossy UTF-8 text under `value_text`. `event_time` is only
/// meaningful when the line is fed back into a reducer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_text: Option<String>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub drop: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
}

impl From<&Envelope> for WireEnvelope {
    fn from(envelope: &Envelope) -> Self {
        if envelope.is_dropped() {
            return Self {
                drop: true,
                ..Default::default()
            };
        }

        let (value, value_text) = match serde_json::from_slice(envelope.value()) {
            Ok(json) => (Some(json), None),
            Err(_) => (
                None,
                Some(String::from_utf8_lossy(envelope.value()).into_owned()),
            ),
        };

        Self {
            value,
            value_text,
            keys: envelope.keys().to_vec(),
            tags: envelope.tags().to_vec(),
            drop: false,
            event_time: None,
        }
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self> {
        if wire.drop {
            if wire.value.is_some() || wire.value_text.is_some() {
                return Err(EnvelopeError::DroppedWithValue);
            }
            return Ok(Envelope::drop_message());
        }

        let value = match (wire.value, wire.value_text) {
            (Some(_), Some(_)) => return Err(EnvelopeError::AmbiguousValue),
            (Some(json), None) => serde_json::to_vec(&json)?,
            (None, Some(text)) => text.into_bytes(),
            (None, None) => Vec::new(),
        };

        Ok(Envelope::new(value).with_keys(wire.keys).with_tags(wire.tags))
    }
}
