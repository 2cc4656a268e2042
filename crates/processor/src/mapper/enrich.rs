//! Food order enrichment
//!
//! Adds the restaurant name and per-dish prices to an order and keys it by
//! restaurant name.

use super::{FailurePolicy, Mapper};
use crate::catalog::Catalog;
use crate::error::InputError;
use crate::record::{Path, Record};
use std::sync::Arc;
use streamfold_types::{Datum, Envelope};
use tracing::{debug, warn};

/// Enriches food orders against the restaurant catalog
#[derive(Debug, Clone)]
pub struct OrderEnricher {
    catalog: Arc<Catalog>,
    policy: FailurePolicy,
}

impl OrderEnricher {
    pub const NAME: &'static str = "enrich";

    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            policy: FailurePolicy::Drop,
        }
    }

    fn enrich(&self, datum: &Datum) -> Result<Envelope, InputError> {
        let order = Record::parse(&datum.value)?;

        let restaurant_id = order
            .get_str(&Path::root().field("restaurant_id"))
            .ok_or_else(|| InputError::malformed("restaurant_id must be a string"))?
            .to_string();
        let dish_count = order
            .get_array(&Path::root().field("dishes"))
            .ok_or_else(|| InputError::malformed("dishes must be an array"))?
            .len();

        let restaurant = self
            .catalog
            .lookup(&restaurant_id)
            .ok_or_else(|| InputError::unresolvable("restaurant_id", restaurant_id.as_str()))?;

        let mut enriched =
            order.with(&Path::root().field("restaurant_name"), restaurant.name.as_str());

        for index in 0..dish_count {
            let dish = Path::root().field("dishes").index(index);
            let dish_id = enriched
                .get_str(&dish.clone().field("dish_id"))
                .unwrap_or_default()
                .to_string();

            let price = match restaurant.child(&dish_id) {
                Some(entry) => entry.price,
                None => {
                    warn!(
                        restaurant_id = %restaurant_id,
                        dish_id = %dish_id,
                        "Unknown dish, pricing at zero"
                    );
                    0.0
                }
            };
            enriched.set_in_place(&dish.field("price"), price);
        }

        let value = enriched.serialize()?;
        debug!(restaurant = %restaurant.name, dishes = dish_count, "Enriched order");

        Ok(Envelope::new(value).with_keys([restaurant.name.as_str()]))
    }
}

impl Mapper for OrderEnricher {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn map(&self, datum: &Datum) -> Vec<Envelope> {
        match self.enrich(datum) {
            Ok(envelope) => vec![envelope],
            Err(e) => vec![self.policy.reject(Self::NAME, &e)],
        }
    }
}
