use super::micros::Micros;
use crate::error::InputError;
use crate::record::{Path, Record};
use crate::window::WindowBounds;
use serde_json::Value;
use std::fmt::Debug;

/// Core trait for per-window aggregates
///
/// An aggregate is a commutative monoid over records: [`Default`] is the
/// empty window, [`WindowAggregate::from_record`] is the contribution of one
/// record, and [`WindowAggregate::merge`] combines two partial results. The
/// summary of a window therefore does not depend on the order its records
/// arrived in, and partial results computed elsewhere can be merged.
pub trait WindowAggregate: Default + Clone + Send + Sync + Debug + 'static {
    /// Stage name, as selected on the command line
    const NAME: &'static str;

    /// Contribution of a single record
    fn from_record(record: &Record) -> Result<Self, InputError>;

    /// Fold one record into the aggregate
    ///
    /// A record that fails to decode leaves the aggregate untouched.
    fn update(&mut self, record: &Record) -> Result<(), InputError> {
        let contribution = Self::from_record(record)?;
        self.merge(contribution);
        Ok(())
    }

    /// Merge another partial aggregate into this one
    fn merge(&mut self, other: Self);

    /// Number of records folded in so far
    fn count(&self) -> u64;

    /// Check if the aggregate has seen any records
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Build the summary record for a window
    fn finalize(&self, keys: &[String], window: &WindowBounds) -> Record;

    /// Keys attached to the summary envelope
    fn output_keys(&self, _keys: &[String]) -> Vec<String> {
        Vec::new()
    }
}

/// Quantity and amount of a list of priced line items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LineTotals {
    pub quantity: i64,
    pub amount: Micros,
}

/// Sum `price * quantity` over line items
///
/// Missing prices and quantities count as zero; present but non-numeric ones
/// make the whole record malformed.
pub(crate) fn sum_line_items(items: &[Value]) -> Result<LineTotals, InputError> {
    let price_path = Path::root().field("price");
    let quantity_path = Path::root().field("quantity");
    let overflow = || InputError::malformed("line item amount out of range");

    let mut totals = LineTotals::default();
    for (position, item) in items.iter().enumerate() {
        let line = Record::new(item.clone());

        let price = match line.get(&price_path) {
            None | Some(Value::Null) => Micros::ZERO,
            Some(value) => value
                .as_f64()
                .and_then(Micros::from_f64)
                .ok_or_else(|| {
                    InputError::malformed(format!("item {} has a non-numeric price", position))
                })?,
        };
        let quantity = match line.get(&quantity_path) {
            None | Some(Value::Null) => 0,
            Some(_) => line
                .get_i64(&quantity_path)
                .ok_or_else(|| {
                    InputError::malformed(format!("item {} has a non-numeric quantity", position))
                })?,
        };

        let amount = price.checked_mul(quantity).ok_or_else(overflow)?;
        totals.amount = totals.amount.checked_add(amount).ok_or_else(overflow)?;
        totals.quantity = totals.quantity.checked_add(quantity).ok_or_else(overflow)?;
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sum_line_items() {
        let items = json!([
            {"price": 21.95, "quantity": 2},
            {"price": 15.95},
            {"quantity": 3},
            {"price": 1.5, "quantity": 1}
        ]);
        let totals = sum_line_items(items.as_array().unwrap()).unwrap();
        assert_eq!(totals.quantity, 6);
        assert_eq!(totals.amount.as_f64(), 45.4);
    }

    #[test]
    fn test_sum_line_items_rejects_non_numeric() {
        let items = json!([{"price": "free", "quantity": 1}]);
        assert!(sum_line_items(items.as_array().unwrap()).is_err());

        let items = json!([{"price": 1.0, "quantity": "two"}]);
        assert!(sum_line_items(items.as_array().unwrap()).is_err());
    }
}
