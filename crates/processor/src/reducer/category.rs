//! Item count and revenue per product category and window

use super::aggregate::{sum_line_items, WindowAggregate};
use super::micros::Micros;
use crate::error::InputError;
use crate::record::{Path, Record};
use crate::window::WindowBounds;
use serde::{Deserialize, Serialize};

/// Items sold and revenue for one category
///
/// The category name is the lexicographically smallest non-empty name seen,
/// so it does not depend on arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySales {
    pub records: u64,
    pub category_name: Option<String>,
    pub item_count: i64,
    pub total_amount: Micros,
}

impl WindowAggregate for CategorySales {
    const NAME: &'static str = "category-aggr";

    fn from_record(record: &Record) -> Result<Self, InputError> {
        let items = record
            .get_array(&Path::root().field("items"))
            .ok_or_else(|| InputError::malformed("items must be an array"))?;
        let totals = sum_line_items(items)?;

        let category_name = record
            .get_str(&Path::root().field("category_name"))
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(Self {
            records: 1,
            category_name,
            item_count: totals.quantity,
            total_amount: totals.amount,
        })
    }

    fn merge(&mut self, other: Self) {
        self.records += other.records;
        self.item_count = self.item_count.saturating_add(other.item_count);
        self.total_amount += other.total_amount;
        self.category_name = match (self.category_name.take(), other.category_name) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    fn count(&self) -> u64 {
        self.records
    }

    fn finalize(&self, keys: &[String], window: &WindowBounds) -> Record {
        let category_id = keys.first().map(String::as_str).unwrap_or_default();

        Record::object()
            .with(&Path::root().field("start"), window.start_rfc3339())
            .with(&Path::root().field("end"), window.end_rfc3339())
            .with(&Path::root().field("category_id"), category_id)
            .with(
                &Path::root().field("category_name"),
                self.category_name.as_deref().unwrap_or_default(),
            )
            .with(&Path::root().field("item_count"), self.item_count)
            .with(&Path::root().field("total_amount"), self.total_amount.as_f64())
    }
}
