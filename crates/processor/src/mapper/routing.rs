//! Content routing
//!
//! Dispatches on the `content-type` header. Images are forwarded to the
//! ASCII art branch; JSON requests name the animals to draw and become one
//! tag per animal. Everything else is answered with an error envelope.

use super::{FailurePolicy, Mapper};
use crate::error::InputError;
use crate::record::{Path, Record};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use streamfold_types::{Datum, Envelope};
use tracing::{debug, warn};

pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const ASCIIART_TAG: &str = "asciiart";

/// Error bodies returned to clients
pub const UNSUPPORTED_CONTENT_TYPE: &str = "Unsupported content type";
pub const INVALID_JSON: &str = "Failed to parse JSON";
pub const UNSUPPORTED_ANIMAL: &str = "Unsupported animal";

/// A failed request: the logged error and the fixed client message
type Rejection = (InputError, &'static str);

/// Content types the router understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Png,
    Json,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Png => "image/png",
            ContentType::Json => "application/json",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ContentType {
    type Err = InputError;

    /// Parameters such as `; charset=utf-8` are ignored
    fn from_str(s: &str) -> Result<Self, InputError> {
        let essence = s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Ok(ContentType::Png),
            "application/json" => Ok(ContentType::Json),
            _ => Err(InputError::unsupported(format!("content type '{}'", s))),
        }
    }
}

/// Routes requests by content type
#[derive(Debug, Clone)]
pub struct ContentRouter {
    allowed: BTreeSet<String>,
    policy: FailurePolicy,
}

impl ContentRouter {
    pub const NAME: &'static str = "planner";

    pub fn new<I, S>(allowed_animals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed_animals.into_iter().map(Into::into).collect(),
            policy: FailurePolicy::ErrorTag,
        }
    }

    fn route(&self, datum: &Datum) -> Result<Envelope, Rejection> {
        let content_type: ContentType = datum
            .header(CONTENT_TYPE_HEADER)
            .ok_or_else(|| InputError::malformed("Content-Type header is missing"))
            .and_then(|value| value.parse())
            .map_err(|e| (e, UNSUPPORTED_CONTENT_TYPE))?;

        match content_type {
            ContentType::Png => Ok(Envelope::new(datum.value.clone())
                .with_keys(datum.keys.iter().cloned())
                .with_tag(ASCIIART_TAG)),
            ContentType::Json => self.route_json(datum),
        }
    }

    fn route_json(&self, datum: &Datum) -> Result<Envelope, Rejection> {
        let request =
            Record::parse(&datum.value).map_err(|e| (InputError::from(e), INVALID_JSON))?;

        let Some(animals) = request.get_array(&Path::root().field("animals")) else {
            warn!(stage = Self::NAME, "Request has no animals array, dropping");
            return Ok(Envelope::drop_message());
        };

        let mut tags = Vec::with_capacity(animals.len());
        for animal in animals {
            match animal {
                Value::String(name) if self.allowed.contains(name) => tags.push(name.clone()),
                other => {
                    let error = InputError::unsupported(format!("animal {}", other));
                    return Err((error, UNSUPPORTED_ANIMAL));
                }
            }
        }

        debug!(animals = ?tags, "Routing request");
        Ok(Envelope::new(datum.value.clone())
            .with_keys(datum.keys.iter().cloned())
            .with_tags(tags))
    }
}

impl Mapper for ContentRouter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn map(&self, datum: &Datum) -> Vec<Envelope> {
        match self.route(datum) {
            Ok(envelope) => vec![envelope],
            Err((error, message)) => vec![self.policy.reject_as(Self::NAME, &error, message)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ERROR_TAG;
    use chrono::Utc;

    fn router() -> ContentRouter {
        ContentRouter::new(["tiger", "dog", "elephant"])
    }

    fn request(content_type: &str, body: &str) -> Datum {
        Datum::new(body, Utc::now())
            .with_keys(["req-1"])
            .with_header("Content-Type", content_type)
    }

    fn error_message(envelope: &Envelope) -> String {
        let body: Value = serde_json::from_slice(envelope.value()).unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!("image/png".parse::<ContentType>().unwrap(), ContentType::Png);
        assert_eq!(
            "Application/JSON; charset=utf-8".parse::<ContentType>().unwrap(),
            ContentType::Json
        );
        assert!("text/plain".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_png_forwarded_to_asciiart() {
        let out = router().map(&request("image/png", "\u{89}PNG"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tags(), &[ASCIIART_TAG.to_string()]);
        assert_eq!(out[0].keys(), &["req-1".to_string()]);
        assert_eq!(out[0].value(), "\u{89}PNG".as_bytes());
    }

    #[test]
    fn test_json_tags_each_animal() {
        let out = router().map(&request("application/json", r#"{"animals": ["tiger", "dog"]}"#));
        assert_eq!(out[0].tags(), &["tiger".to_string(), "dog".to_string()]);
        assert_eq!(out[0].keys(), &["req-1".to_string()]);
        assert!(!out[0].has_tag(ERROR_TAG));
    }

    #[test]
    fn test_json_repeated_animal_tagged_once() {
        let out = router().map(&request("application/json", r#"{"animals": ["dog", "dog"]}"#));
        assert_eq!(out[0].tags(), &["dog".to_string()]);
    }

    #[test]
    fn test_json_unknown_animal_is_error() {
        let out = router().map(&request("application/json", r#"{"animals": ["tiger", "cat"]}"#));
        assert_eq!(out[0].tags(), &[ERROR_TAG.to_string()]);
        assert_eq!(error_message(&out[0]), UNSUPPORTED_ANIMAL);
        assert!(out[0].keys().is_empty());
    }

    #[test]
    fn test_json_without_animals_drops() {
        let out = router().map(&request("application/json", r#"{"plants": []}"#));
        assert!(out[0].is_dropped());
    }

    #[test]
    fn test_bad_json_is_error() {
        let out = router().map(&request("application/json", "{oops"));
        assert!(out[0].has_tag(ERROR_TAG));
        assert_eq!(error_message(&out[0]), INVALID_JSON);
    }

    #[test]
    fn test_missing_and_unsupported_content_type() {
        let missing = router().map(&Datum::new("{}", Utc::now()));
        assert_eq!(error_message(&missing[0]), UNSUPPORTED_CONTENT_TYPE);

        let unsupported = router().map(&request("text/plain", "hi"));
        assert!(unsupported[0].has_tag(ERROR_TAG));
        assert_eq!(unsupported[0].value(), br#"{"error":"Unsupported content type"}"#);
    }

    #[test]
    fn test_custom_allow_list() {
        let router = ContentRouter::new(["cat"]);
        let out = router.map(&request("application/json", r#"{"animals": ["cat"]}"#));
        assert_eq!(out[0].tags(), &["cat".to_string()]);
    }
}
