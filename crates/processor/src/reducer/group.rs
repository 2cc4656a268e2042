//! Per-invocation reducer state
//!
//! A [`WindowGroup`] is created when the runtime opens one key+window, sees
//! every datum routed to it, and is consumed by [`WindowGroup::emit`] once
//! the input stream has ended.

use super::aggregate::WindowAggregate;
use crate::error::{InputError, WindowError, WindowResult};
use crate::record::Record;
use crate::window::{Window, WindowBounds};
use std::fmt;
use streamfold_types::{Datum, Envelope};
use tracing::{debug, error, info, warn};

/// Lifecycle of a window group
///
/// `Emitted` is not a state: [`WindowGroup::emit`] consumes the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Created, nothing observed yet
    Open,
    /// At least one datum observed
    Accumulating,
    /// Input stream ended; no more datums accepted
    Closed,
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupState::Open => write!(f, "open"),
            GroupState::Accumulating => write!(f, "accumulating"),
            GroupState::Closed => write!(f, "closed"),
        }
    }
}

/// Why a datum did not contribute to the aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Datum keys differ from the group's partition keys
    KeyMismatch,
    /// Event time outside `[start, end)`
    OutOfWindow,
    /// Payload failed to decode
    Malformed(String),
}

/// Outcome of observing one datum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Accepted,
    Skipped(SkipReason),
}

/// Accumulator for one partition key and one window
#[derive(Debug)]
pub struct WindowGroup<A> {
    keys: Vec<String>,
    window: Window,
    aggregate: A,
    state: GroupState,
    observed: u64,
    skipped: u64,
}

impl<A: WindowAggregate> WindowGroup<A> {
    pub fn new(keys: Vec<String>, bounds: WindowBounds) -> Self {
        Self {
            keys,
            window: Window::new(bounds),
            aggregate: A::default(),
            state: GroupState::Open,
            observed: 0,
            skipped: 0,
        }
    }

    /// Observe one datum
    ///
    /// Datums for other keys, outside the window or with an undecodable
    /// payload are skipped and logged. Observing a closed group is an error.
    pub fn observe(&mut self, datum: &Datum) -> WindowResult<Observation> {
        if self.state == GroupState::Closed {
            return Err(WindowError::WindowClosed {
                window_id: self.window.id.clone(),
            });
        }
        self.state = GroupState::Accumulating;

        let outcome = self.classify(datum);
        match &outcome {
            Observation::Accepted => self.observed += 1,
            Observation::Skipped(reason) => {
                self.skipped += 1;
                warn!(
                    stage = A::NAME,
                    window_id = %self.window.id,
                    keys = ?datum.keys,
                    reason = ?reason,
                    "Skipping datum"
                );
            }
        }
        Ok(outcome)
    }

    fn classify(&mut self, datum: &Datum) -> Observation {
        if datum.keys != self.keys {
            return Observation::Skipped(SkipReason::KeyMismatch);
        }
        if !self.window.contains(datum.event_time) {
            return Observation::Skipped(SkipReason::OutOfWindow);
        }

        let result = Record::parse(&datum.value)
            .map_err(InputError::from)
            .and_then(|record| self.aggregate.update(&record));
        match result {
            Ok(()) => Observation::Accepted,
            Err(e) => Observation::Skipped(SkipReason::Malformed(e.to_string())),
        }
    }

    /// Mark the input stream as ended
    pub fn close(&mut self) {
        if self.state != GroupState::Closed {
            debug!(stage = A::NAME, window_id = %self.window.id, "Closing window group");
            self.state = GroupState::Closed;
        }
    }

    /// Produce the single summary envelope for this group
    ///
    /// Closes the group first if the caller has not. If the summary cannot be
    /// encoded the drop sentinel is emitted instead.
    pub fn emit(mut self) -> Envelope {
        self.close();

        if self.aggregate.is_empty() {
            debug!(
                stage = A::NAME,
                window_id = %self.window.id,
                skipped = self.skipped,
                "Window saw no records, emitting zero totals"
            );
        }

        let summary = self.aggregate.finalize(&self.keys, &self.window.bounds);
        match summary.serialize() {
            Ok(value) => {
                info!(
                    stage = A::NAME,
                    window_id = %self.window.id,
                    keys = ?self.keys,
                    observed = self.observed,
                    skipped = self.skipped,
                    summary = %summary,
                    "Window aggregated"
                );
                Envelope::new(value).with_keys(self.aggregate.output_keys(&self.keys))
            }
            Err(e) => {
                error!(
                    stage = A::NAME,
                    window_id = %self.window.id,
                    error = %e,
                    "Failed to serialize window summary, dropping"
                );
                Envelope::drop_message()
            }
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    pub fn state(&self) -> GroupState {
        self.state
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::RestaurantSales;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn group() -> WindowGroup<RestaurantSales> {
        WindowGroup::new(
            vec!["Paesano".to_string()],
            WindowBounds::new(at(60_000), at(120_000)),
        )
    }

    fn order(millis: i64) -> Datum {
        let body = json!({"dishes": [{"price": 10.0, "quantity": 1}]}).to_string();
        Datum::new(body, at(millis)).with_keys(["Paesano"])
    }

    #[test]
    fn test_lifecycle() {
        let mut group = group();
        assert_eq!(group.state(), GroupState::Open);

        assert_eq!(group.observe(&order(60_000)).unwrap(), Observation::Accepted);
        assert_eq!(group.state(), GroupState::Accumulating);

        group.close();
        assert_eq!(group.state(), GroupState::Closed);
        assert!(matches!(
            group.observe(&order(60_001)),
            Err(WindowError::WindowClosed { .. })
        ));
        assert_eq!(group.observed(), 1);
    }

    #[test]
    fn test_skips_foreign_and_late_datums() {
        let mut group = group();

        let foreign = order(60_000).with_keys(["Taqueria"]);
        assert_eq!(
            group.observe(&foreign).unwrap(),
            Observation::Skipped(SkipReason::KeyMismatch)
        );
        assert_eq!(
            group.observe(&order(120_000)).unwrap(),
            Observation::Skipped(SkipReason::OutOfWindow)
        );
        assert_eq!(
            group.observe(&order(59_999)).unwrap(),
            Observation::Skipped(SkipReason::OutOfWindow)
        );

        let garbage = Datum::new("{", at(60_000)).with_keys(["Paesano"]);
        assert!(matches!(
            group.observe(&garbage).unwrap(),
            Observation::Skipped(SkipReason::Malformed(_))
        ));

        assert_eq!(group.skipped(), 4);
        assert_eq!(group.observed(), 0);
        assert!(group.aggregate().is_empty());
    }

    #[test]
    fn test_emit_without_close() {
        let mut group = group();
        group.observe(&order(61_000)).unwrap();
        group.observe(&order(62_000)).unwrap();

        let envelope = group.emit();
        let value: Value = serde_json::from_slice(envelope.value()).unwrap();
        assert_eq!(value["order_count"], 2);
        assert_eq!(value["total_amount"], 20.0);
    }

    #[test]
    fn test_emit_empty_group() {
        let envelope = group().emit();
        assert!(!envelope.is_dropped());

        let value: Value = serde_json::from_slice(envelope.value()).unwrap();
        assert_eq!(value["order_count"], 0);
        assert_eq!(value["total_amount"], 0.0);
    }
}
