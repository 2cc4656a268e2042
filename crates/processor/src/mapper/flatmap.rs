//! Retail order fan-out
//!
//! Splits one order into one output per product category. Line items are
//! bucketed in the order their category is first seen, and every line item
//! of the input lands in exactly one bucket.

use super::{FailurePolicy, Mapper};
use crate::catalog::Catalog;
use crate::error::InputError;
use crate::record::{Path, Record};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use streamfold_types::{Datum, Envelope};
use tracing::{debug, warn};

/// Bucket for products the catalog does not know
pub const UNCATEGORIZED: &str = "uncategorized";

/// Splits retail orders by product category
#[derive(Debug, Clone)]
pub struct CategorySplitter {
    catalog: Arc<Catalog>,
    policy: FailurePolicy,
}

#[derive(Debug)]
struct Bucket {
    category_id: String,
    category_name: String,
    items: Vec<Value>,
}

impl CategorySplitter {
    pub const NAME: &'static str = "flatmap";

    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            policy: FailurePolicy::Drop,
        }
    }

    fn split(&self, datum: &Datum) -> Result<Vec<Envelope>, InputError> {
        let order = Record::parse(&datum.value)?;

        let order_id = order
            .get_str(&Path::root().field("id"))
            .ok_or_else(|| InputError::malformed("id must be a string"))?;
        let items = order
            .get_array(&Path::root().field("items"))
            .ok_or_else(|| InputError::malformed("items must be an array"))?;
        let order_time = order.get(&Path::root().field("order_time"));

        let mut buckets: Vec<Bucket> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for item in items {
            let line = Record::new(item.clone());
            let product_id = line
                .get_str(&Path::root().field("product_id"))
                .unwrap_or_default();
            let quantity = line.get_i64(&Path::root().field("quantity")).unwrap_or(0);

            let (category_id, category_name, product_name, price) =
                match self.catalog.owner_of(product_id) {
                    Some(category) => {
                        let product = category.child(product_id);
                        (
                            category.id.as_str(),
                            category.name.as_str(),
                            product.map(|p| p.name.as_str()).unwrap_or_default(),
                            product.map(|p| p.price).unwrap_or(0.0),
                        )
                    }
                    None => {
                        warn!(
                            order_id = %order_id,
                            product_id = %product_id,
                            "Unknown product, bucketing as uncategorized"
                        );
                        (UNCATEGORIZED, "", "", 0.0)
                    }
                };

            let slot = *index.entry(category_id.to_string()).or_insert_with(|| {
                buckets.push(Bucket {
                    category_id: category_id.to_string(),
                    category_name: category_name.to_string(),
                    items: Vec::new(),
                });
                buckets.len() - 1
            });

            buckets[slot].items.push(json!({
                "product_id": product_id,
                "name": product_name,
                "quantity": quantity,
                "price": price,
            }));
        }

        let mut out = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let mut record = Record::object().with(&Path::root().field("order_id"), order_id);
            if let Some(time) = order_time {
                record.set_in_place(&Path::root().field("order_time"), time.clone());
            }
            let record = record
                .with(&Path::root().field("category_id"), bucket.category_id.as_str())
                .with(&Path::root().field("category_name"), bucket.category_name.as_str())
                .with(&Path::root().field("items"), Value::Array(bucket.items));

            out.push(Envelope::new(record.serialize()?).with_keys([bucket.category_id]));
        }

        debug!(order_id = %order_id, buckets = out.len(), "Split order by category");
        Ok(out)
    }
}

impl Mapper for CategorySplitter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn map(&self, datum: &Datum) -> Vec<Envelope> {
        match self.split(datum) {
            Ok(envelopes) => envelopes,
            Err(e) => vec![self.policy.reject(Self::NAME, &e)],
        }
    }
}
