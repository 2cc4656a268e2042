//! Reference catalog used for enrichment joins
//!
//! The catalog is built once from a JSON document shaped like
//!
//! ```json
//! {
//!   "rstt-003": {
//!     "name": "Paesano",
//!     "menu": [{"id": "rstt-003-d002", "name": "Lasagna", "price": 21.95}]
//!   }
//! }
//! ```
//!
//! where the name of the child list (`menu` above) is given by the
//! [`CatalogSchema`]. After construction the catalog is never mutated, so it
//! is shared between mapper invocations as an `Arc<Catalog>` without locking.
//! All lookups are exact-match `BTreeMap` searches.

use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Field names used to read a catalog document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSchema {
    /// Field holding the nested child list of each entity
    pub children_field: String,
}

impl CatalogSchema {
    pub fn new(children_field: impl Into<String>) -> Self {
        Self {
            children_field: children_field.into(),
        }
    }

    /// Restaurants with a `menu` of dishes
    pub fn restaurants() -> Self {
        Self::new("menu")
    }

    /// Product categories with a `products` list
    pub fn products() -> Self {
        Self::new("products")
    }
}

/// Nested child of a catalog entity (a dish, a product)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl ChildEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Top-level catalog entity (a restaurant, a product category)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub price: f64,
    children: BTreeMap<String, ChildEntry>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: 0.0,
            children: BTreeMap::new(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Add a child; a later child with the same ID replaces the earlier one
    pub fn with_child(mut self, child: ChildEntry) -> Self {
        self.children.insert(child.id.clone(), child);
        self
    }

    pub fn child(&self, child_id: &str) -> Option<&ChildEntry> {
        self.children.get(child_id)
    }

    pub fn children(&self) -> impl Iterator<Item = &ChildEntry> {
        self.children.values()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Immutable keyed reference dataset
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
    /// child ID -> owning entity ID
    owners: BTreeMap<String, String>,
}

impl Catalog {
    /// Build a catalog from already constructed entries
    pub fn from_entries<I>(entries: I) -> CatalogResult<Self>
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        let mut catalog = Catalog::default();
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Parse a catalog document
    pub fn from_slice(bytes: &[u8], schema: &CatalogSchema) -> CatalogResult<Self> {
        let document: Value = serde_json::from_slice(bytes)?;
        let Value::Object(entities) = document else {
            return Err(CatalogError::Malformed {
                entity: String::new(),
                reason: "catalog root must be an object".to_string(),
            });
        };

        let mut catalog = Catalog::default();
        for (id, body) in entities {
            let entry = parse_entry(&id, &body, schema)?;
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Load and parse a catalog document from disk
    pub fn from_path(path: impl AsRef<Path>, schema: &CatalogSchema) -> CatalogResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_slice(&bytes, schema)?;

        info!(
            path = %path.display(),
            entities = catalog.len(),
            children = catalog.owners.len(),
            "Loaded reference catalog"
        );
        Ok(catalog)
    }

    fn insert(&mut self, entry: CatalogEntry) -> CatalogResult<()> {
        if self.entries.contains_key(&entry.id) {
            return Err(CatalogError::DuplicateEntity { entity: entry.id });
        }

        for child_id in entry.children.keys() {
            match self.owners.get(child_id) {
                Some(owner) => warn!(
                    child = %child_id,
                    owner = %owner,
                    ignored = %entry.id,
                    "Child listed by several entities, keeping first owner"
                ),
                None => {
                    self.owners.insert(child_id.clone(), entry.id.clone());
                }
            }
        }

        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Exact-match entity lookup
    pub fn lookup(&self, entity_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(entity_id)
    }

    /// Exact-match lookup of a child under a given entity
    pub fn lookup_child(&self, entity_id: &str, child_id: &str) -> Option<&ChildEntry> {
        self.lookup(entity_id)?.child(child_id)
    }

    /// Entity that lists `child_id` among its children
    pub fn owner_of(&self, child_id: &str) -> Option<&CatalogEntry> {
        self.owners
            .get(child_id)
            .and_then(|owner| self.entries.get(owner))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entry(id: &str, body: &Value, schema: &CatalogSchema) -> CatalogResult<CatalogEntry> {
    let malformed = |reason: String| CatalogError::Malformed {
        entity: id.to_string(),
        reason,
    };

    let Value::Object(fields) = body else {
        return Err(malformed("entity must be an object".to_string()));
    };

    let name = optional_str(fields.get("name"))
        .map_err(|_| malformed("name must be a string".to_string()))?;
    let price = optional_f64(fields.get("price"))
        .map_err(|_| malformed("price must be a number".to_string()))?;
    let mut entry = CatalogEntry::new(id, name).with_price(price);

    let children = match fields.get(&schema.children_field) {
        None | Some(Value::Null) => return Ok(entry),
        Some(Value::Array(children)) => children,
        Some(_) => {
            return Err(malformed(format!(
                "{} must be an array",
                schema.children_field
            )))
        }
    };

    for (position, child) in children.iter().enumerate() {
        let Value::Object(child) = child else {
            return Err(malformed(format!(
                "{}[{}] must be an object",
                schema.children_field, position
            )));
        };
        let child_id = match child.get("id") {
            Some(Value::String(child_id)) if !child_id.is_empty() => child_id.clone(),
            _ => {
                return Err(malformed(format!(
                    "{}[{}].id must be a non-empty string",
                    schema.children_field, position
                )))
            }
        };
        let child_name = optional_str(child.get("name"))
            .map_err(|_| malformed(format!("{}.name must be a string", child_id)))?;
        let child_price = optional_f64(child.get("price"))
            .map_err(|_| malformed(format!("{}.price must be a number", child_id)))?;

        if entry.child(&child_id).is_some() {
            return Err(CatalogError::DuplicateChild {
                entity: id.to_string(),
                child: child_id,
            });
        }
        entry = entry.with_child(ChildEntry::new(child_id, child_name, child_price));
    }

    Ok(entry)
}

fn optional_str(value: Option<&Value>) -> Result<String, ()> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(()),
    }
}

fn optional_f64(value: Option<&Value>) -> Result<f64, ()> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => v.as_f64().ok_or(()),
    }
}
