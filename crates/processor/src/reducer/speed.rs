//! Average vehicle speed per key and window

use super::aggregate::WindowAggregate;
use super::micros::Micros;
use crate::error::InputError;
use crate::record::{Path, Record};
use crate::window::WindowBounds;
use serde::{Deserialize, Serialize};

/// Speed sum and reading count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageSpeed {
    pub vehicles_count: u64,
    pub speed_sum: Micros,
}

impl AverageSpeed {
    /// Mean speed, zero for an empty window
    pub fn mean(&self) -> f64 {
        if self.vehicles_count == 0 {
            return 0.0;
        }
        self.speed_sum.raw() as f64 / self.vehicles_count as f64 / Micros::SCALE as f64
    }
}

impl WindowAggregate for AverageSpeed {
    const NAME: &'static str = "average";

    fn from_record(record: &Record) -> Result<Self, InputError> {
        let speed = record
            .get_f64(&Path::root().field("speed"))
            .and_then(Micros::from_f64)
            .ok_or_else(|| InputError::malformed("speed must be a number"))?;

        Ok(Self {
            vehicles_count: 1,
            speed_sum: speed,
        })
    }

    fn merge(&mut self, other: Self) {
        self.vehicles_count += other.vehicles_count;
        self.speed_sum += other.speed_sum;
    }

    fn count(&self) -> u64 {
        self.vehicles_count
    }

    fn finalize(&self, _keys: &[String], window: &WindowBounds) -> Record {
        Record::object()
            .with(&Path::root().field("vehicles_count"), self.vehicles_count)
            .with(&Path::root().field("avg_speed"), self.mean())
            .with(&Path::root().field("timestamp"), window.start.timestamp_millis())
    }

    fn output_keys(&self, keys: &[String]) -> Vec<String> {
        keys.to_vec()
    }
}
