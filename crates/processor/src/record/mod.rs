//! Record codec
//!
//! A [`Record`] is an immutable JSON tree addressed with [`Path`] expressions.
//! Reads borrow into the tree. Writes are copy-on-write: [`Record::set`]
//! returns a new record and leaves every other holder of the original
//! untouched, so one input can diverge into several independently built
//! output branches.
//!
//! # Write semantics
//!
//! - Missing intermediate nodes are created (object for a field segment,
//!   array for an index segment).
//! - Writing an index past the end of an array extends it, padding the gap
//!   with `null`.
//! - Writing through a node of the wrong shape replaces it with the container
//!   the next segment needs. An index segment applied to an object addresses
//!   the field with that decimal name.

mod path;

pub use path::{Path, Segment};

use crate::error::{CodecError, CodecResult};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Immutable, cheaply cloneable JSON record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    root: Arc<Value>,
}

impl Record {
    /// Wrap an existing JSON value
    pub fn new(value: Value) -> Self {
        Self {
            root: Arc::new(value),
        }
    }

    /// Empty object record
    pub fn object() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Parse a record from its wire encoding
    pub fn parse(bytes: &[u8]) -> CodecResult<Self> {
        serde_json::from_slice(bytes)
            .map(Self::new)
            .map_err(|e| CodecError::Parse(e.to_string()))
    }

    /// Encode the record to its wire form
    pub fn serialize(&self) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(self.root.as_ref()).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Arc::try_unwrap(self.root).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Resolve a path; `None` when any segment is missing
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let mut node = self.root.as_ref();
        for segment in path.segments() {
            node = match (segment, node) {
                (Segment::Field(name), Value::Object(map)) => map.get(name)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(node)
    }

    pub fn get_str(&self, path: &Path) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_f64(&self, path: &Path) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// Integer view of a number; floats are truncated toward zero
    pub fn get_i64(&self, path: &Path) -> Option<i64> {
        let value = self.get(path)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
    }

    pub fn get_array(&self, path: &Path) -> Option<&Vec<Value>> {
        self.get(path).and_then(Value::as_array)
    }

    /// Return a copy of this record with `value` written at `path`
    pub fn set(&self, path: &Path, value: impl Into<Value>) -> Record {
        self.clone().with(path, value)
    }

    /// Consuming variant of [`Record::set`]; avoids a copy when this is the only holder
    pub fn with(mut self, path: &Path, value: impl Into<Value>) -> Record {
        self.set_in_place(path, value);
        self
    }

    /// Write `value` at `path` into this handle's own copy of the tree
    pub fn set_in_place(&mut self, path: &Path, value: impl Into<Value>) {
        assign(Arc::make_mut(&mut self.root), path.segments(), value.into());
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::object()
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

fn assign(slot: &mut Value, segments: &[Segment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *slot = value;
        return;
    };

    match head {
        Segment::Field(name) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                assign(map.entry(name.clone()).or_insert(Value::Null), rest, value);
            }
        }
        Segment::Index(index) => {
            if let Value::Object(map) = slot {
                assign(map.entry(index.to_string()).or_insert(Value::Null), rest, value);
                return;
            }
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                if items.len() <= *index {
                    items.resize(*index + 1, Value::Null);
                }
                assign(&mut items[*index], rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(expr: &str) -> Path {
        Path::parse(expr).unwrap()
    }

    #[test]
    fn test_get_nested_values() {
        let record = Record::new(json!({
            "id": "order-1",
            "dishes": [{"dish_id": "d1", "quantity": 2}],
            "meta": {"3": "three"}
        }));

        assert_eq!(record.get_str(&p("id")), Some("order-1"));
        assert_eq!(record.get_str(&p("dishes.0.dish_id")), Some("d1"));
        assert_eq!(record.get_i64(&p("dishes.0.quantity")), Some(2));
        assert_eq!(record.get_str(&p("meta.3")), Some("three"));
        assert!(record.get(&p("dishes.1")).is_none());
        assert!(record.get(&p("id.x")).is_none());
        assert_eq!(record.get(&Path::root()), Some(record.as_value()));
    }

    #[test]
    fn test_get_i64_truncates_floats() {
        let record = Record::new(json!({"q": 2.9}));
        assert_eq!(record.get_i64(&p("q")), Some(2));
    }

    #[test]
    fn test_set_is_pure() {
        let original = Record::new(json!({"a": 1}));
        let updated = original.set(&p("b"), "two");

        assert_eq!(original.as_value(), &json!({"a": 1}));
        assert_eq!(updated.as_value(), &json!({"a": 1, "b": "two"}));
    }

    #[test]
    fn test_branches_diverge_independently() {
        let base = Record::new(json!({"items": []}));
        let left = base.set(&p("items.0"), "l");
        let right = base.clone().with(&p("items.0"), "r");

        assert_eq!(left.get_str(&p("items.0")), Some("l"));
        assert_eq!(right.get_str(&p("items.0")), Some("r"));
        assert_eq!(base.as_value(), &json!({"items": []}));
    }

    #[test]
    fn test_set_creates_intermediate_containers() {
        let record = Record::object()
            .with(&p("items.0.product_id"), "p-1")
            .with(&p("items.0.quantity"), 2)
            .with(&p("items.1.product_id"), "p-2");

        assert_eq!(
            record.as_value(),
            &json!({"items": [{"product_id": "p-1", "quantity": 2}, {"product_id": "p-2"}]})
        );
    }

    #[test]
    fn test_sparse_write_pads_with_null() {
        let record = Record::object().with(&p("xs.2"), true);
        assert_eq!(record.as_value(), &json!({"xs": [null, null, true]}));
    }

    #[test]
    fn test_write_through_scalar_replaces_it() {
        let record = Record::new(json!({"a": 5})).with(&p("a.b"), 1);
        assert_eq!(record.as_value(), &json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_index_on_object_addresses_field() {
        let record = Record::new(json!({"m": {}})).with(&p("m.0"), "zero");
        assert_eq!(record.as_value(), &json!({"m": {"0": "zero"}}));
    }

    #[test]
    fn test_set_root_replaces_record() {
        let record = Record::object().with(&Path::root(), json!([1, 2]));
        assert_eq!(record.as_value(), &json!([1, 2]));
    }

    #[test]
    fn test_parse_serialize_roundtrip() {
        let bytes = br#"{"id":"order-1","dishes":[{"dish_id":"d1","price":21.95}]}"#;
        let record = Record::parse(bytes).unwrap();
        let encoded = record.serialize().unwrap();

        assert_eq!(Record::parse(&encoded).unwrap(), record);
        assert_eq!(encoded, bytes.to_vec());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Record::parse(b"{not json"), Err(CodecError::Parse(_))));
    }
}
