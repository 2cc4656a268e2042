//! Vehicle telemetry re-keying

use super::{FailurePolicy, Mapper};
use crate::error::InputError;
use crate::record::{Path, Record};
use streamfold_types::{Datum, Envelope};

pub const CAR_TAG: &str = "car";
pub const NOT_CAR_TAG: &str = "not_car";

/// Keys vehicle readings by `[vehicle_type, color]` and tags cars
#[derive(Debug, Clone)]
pub struct VehicleKeyer {
    policy: FailurePolicy,
}

impl VehicleKeyer {
    pub const NAME: &'static str = "keying";

    pub fn new() -> Self {
        Self {
            policy: FailurePolicy::Drop,
        }
    }

    fn key(&self, datum: &Datum) -> Result<Envelope, InputError> {
        let reading = Record::parse(&datum.value)?;

        let required = |field: &str| {
            reading
                .get_str(&Path::root().field(field))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    InputError::malformed(format!("{} must be a non-empty string", field))
                })
        };
        let vehicle_type = required("vehicle_type")?;
        let color = required("color")?;

        let tag = if vehicle_type == "car" { CAR_TAG } else { NOT_CAR_TAG };

        Ok(Envelope::new(datum.value.clone())
            .with_keys([vehicle_type, color])
            .with_tag(tag))
    }
}

impl Default for VehicleKeyer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for VehicleKeyer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn map(&self, datum: &Datum) -> Vec<Envelope> {
        match self.key(datum) {
            Ok(envelope) => vec![envelope],
            Err(e) => vec![self.policy.reject(Self::NAME, &e)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn map(payload: &str) -> Vec<Envelope> {
        VehicleKeyer::new().map(&Datum::new(payload, Utc::now()))
    }

    #[test]
    fn test_keys_and_tags_car() {
        let payload =
            json!({"vehicle_id": "VH1", "vehicle_type": "car", "color": "red", "speed": 88})
                .to_string();
        let out = map(&payload);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].keys(), &["car".to_string(), "red".to_string()]);
        assert_eq!(out[0].tags(), &[CAR_TAG.to_string()]);
        assert_eq!(out[0].value(), payload.as_bytes());
    }

    #[test]
    fn test_tags_not_car() {
        let out = map(r#"{"vehicle_type": "truck", "color": "blue"}"#);
        assert_eq!(out[0].tags(), &[NOT_CAR_TAG.to_string()]);
        assert_eq!(out[0].keys(), &["truck".to_string(), "blue".to_string()]);
    }

    #[test]
    fn test_drops_incomplete_readings() {
        for payload in [
            r#"{"color": "blue"}"#,
            r#"{"vehicle_type": "car"}"#,
            r#"{"vehicle_type": "", "color": "blue"}"#,
            r#"{"vehicle_type": 4, "color": "blue"}"#,
            "garbage",
        ] {
            let out = map(payload);
            assert_eq!(out.len(), 1);
            assert!(out[0].is_dropped(), "expected drop for {}", payload);
        }
    }
}
