//! Order count and revenue per restaurant and window

use super::aggregate::{sum_line_items, WindowAggregate};
use super::micros::Micros;
use crate::error::InputError;
use crate::record::{Path, Record};
use crate::window::WindowBounds;
use serde::{Deserialize, Serialize};

/// Orders and revenue for one restaurant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantSales {
    pub order_count: u64,
    pub total_amount: Micros,
}

impl WindowAggregate for RestaurantSales {
    const NAME: &'static str = "aggr";

    fn from_record(record: &Record) -> Result<Self, InputError> {
        let total_amount = match record.get(&Path::root().field("dishes")) {
            None => Micros::ZERO,
            Some(dishes) => {
                let dishes = dishes
                    .as_array()
                    .ok_or_else(|| InputError::malformed("dishes must be an array"))?;
                sum_line_items(dishes)?.amount
            }
        };

        Ok(Self {
            order_count: 1,
            total_amount,
        })
    }

    fn merge(&mut self, other: Self) {
        self.order_count += other.order_count;
        self.total_amount += other.total_amount;
    }

    fn count(&self) -> u64 {
        self.order_count
    }

    fn finalize(&self, keys: &[String], window: &WindowBounds) -> Record {
        let restaurant_name = keys.first().map(String::as_str).unwrap_or_default();

        Record::object()
            .with(&Path::root().field("start"), window.start_rfc3339())
            .with(&Path::root().field("end"), window.end_rfc3339())
            .with(&Path::root().field("restaurant_name"), restaurant_name)
            .with(&Path::root().field("order_count"), self.order_count)
            .with(&Path::root().field("total_amount"), self.total_amount.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn window() -> WindowBounds {
        WindowBounds::new(
            Utc.with_ymd_and_hms(2024, 10, 30, 20, 1, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 10, 30, 20, 2, 0).unwrap(),
        )
    }

    #[test]
    fn test_single_order() {
        let order = Record::new(json!({
            "restaurant_name": "Paesano",
            "dishes": [{"dish_id": "rstt-003-d002", "price": 21.95, "quantity": 2}]
        }));
        let sales = RestaurantSales::from_record(&order).unwrap();
        let summary = sales.finalize(&["Paesano".to_string()], &window());

        assert_eq!(
            summary.as_value(),
            &json!({
                "start": "2024-10-30T20:01:00Z",
                "end": "2024-10-30T20:02:00Z",
                "restaurant_name": "Paesano",
                "order_count": 1,
                "total_amount": 43.9
            })
        );
    }

    #[test]
    fn test_order_without_dishes_still_counts() {
        let sales = RestaurantSales::from_record(&Record::object()).unwrap();
        assert_eq!(sales.order_count, 1);
        assert_eq!(sales.total_amount, Micros::ZERO);

        assert!(RestaurantSales::from_record(&Record::new(json!({"dishes": 3}))).is_err());
    }

    #[test]
    fn test_merge_is_exact() {
        let mut left = RestaurantSales::from_record(&Record::new(json!({
            "dishes": [{"price": 0.1, "quantity": 1}]
        })))
        .unwrap();
        let right = RestaurantSales::from_record(&Record::new(json!({
            "dishes": [{"price": 0.2, "quantity": 1}]
        })))
        .unwrap();

        left.merge(right);
        assert_eq!(left.count(), 2);
        assert_eq!(left.total_amount.as_f64(), 0.3);
    }

    #[test]
    fn test_no_output_keys() {
        assert!(RestaurantSales::default()
            .output_keys(&["Paesano".to_string()])
            .is_empty());
    }
}
