//! Reducer stages
//!
//! A reducer is invoked once per partition key and window. It drains a
//! stream of datums until the runtime ends it, folds every datum into a
//! [`WindowGroup`], and emits exactly one summary envelope.
//!
//! The input is any `futures::Stream<Item = Datum>`; the end of the stream is
//! the close signal. A channel (`tokio::sync::mpsc` behind
//! `tokio_stream::wrappers::ReceiverStream`) and an in-memory batch
//! (`futures::stream::iter`) both qualify.

mod aggregate;
mod category;
mod group;
mod micros;
mod restaurant;
mod speed;

pub use aggregate::WindowAggregate;
pub use category::CategorySales;
pub use group::{GroupState, Observation, SkipReason, WindowGroup};
pub use micros::Micros;
pub use restaurant::RestaurantSales;
pub use speed::AverageSpeed;

use crate::error::{ProcessorError, Result};
use crate::window::WindowBounds;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;
use streamfold_types::{Datum, Envelope};
use tracing::{debug, error};

/// A stateful per-key, per-window aggregation stage
#[async_trait]
pub trait Reducer: Send + Sync + fmt::Debug {
    /// Stage name, as selected on the command line
    fn name(&self) -> &str;

    /// Drain `inputs` and return the window's output envelopes
    ///
    /// Always returns exactly one envelope, possibly the drop sentinel.
    async fn reduce(
        &self,
        keys: Vec<String>,
        window: WindowBounds,
        inputs: BoxStream<'static, Datum>,
    ) -> Vec<Envelope>;
}

/// Reducer driving a [`WindowAggregate`] over one window
pub struct WindowReducer<A> {
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: WindowAggregate> WindowReducer<A> {
    pub fn new() -> Self {
        Self {
            _aggregate: PhantomData,
        }
    }

    /// Receive loop over one window's input
    pub async fn run<S>(&self, keys: Vec<String>, window: WindowBounds, mut inputs: S) -> Envelope
    where
        S: Stream<Item = Datum> + Unpin + Send,
    {
        let mut group = WindowGroup::<A>::new(keys, window);
        debug!(stage = A::NAME, window_id = %group.window().id, "Window group opened");

        while let Some(datum) = inputs.next().await {
            if let Err(e) = group.observe(&datum) {
                error!(stage = A::NAME, error = %e, "Datum observed after close");
            }
        }

        group.close();
        group.emit()
    }
}

impl<A: WindowAggregate> Default for WindowReducer<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for WindowReducer<A>
where
    A: WindowAggregate,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowReducer").field("stage", &A::NAME).finish()
    }
}

#[async_trait]
impl<A: WindowAggregate> Reducer for WindowReducer<A> {
    fn name(&self) -> &str {
        A::NAME
    }

    async fn reduce(
        &self,
        keys: Vec<String>,
        window: WindowBounds,
        inputs: BoxStream<'static, Datum>,
    ) -> Vec<Envelope> {
        vec![self.run(keys, window, inputs).await]
    }
}

/// The reducer stages this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReducerKind {
    /// Orders and revenue per restaurant
    Aggr,
    /// Items and revenue per product category
    CategoryAggr,
    /// Average vehicle speed
    Average,
}

impl ReducerKind {
    pub const ALL: [ReducerKind; 3] = [
        ReducerKind::Aggr,
        ReducerKind::CategoryAggr,
        ReducerKind::Average,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReducerKind::Aggr => RestaurantSales::NAME,
            ReducerKind::CategoryAggr => CategorySales::NAME,
            ReducerKind::Average => AverageSpeed::NAME,
        }
    }

    pub fn build(&self) -> Arc<dyn Reducer> {
        match self {
            ReducerKind::Aggr => Arc::new(WindowReducer::<RestaurantSales>::new()),
            ReducerKind::CategoryAggr => Arc::new(WindowReducer::<CategorySales>::new()),
            ReducerKind::Average => Arc::new(WindowReducer::<AverageSpeed>::new()),
        }
    }
}

impl fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReducerKind {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggr" => Ok(ReducerKind::Aggr),
            "category-aggr" | "category_aggr" => Ok(ReducerKind::CategoryAggr),
            "average" | "compute_average_udf" => Ok(ReducerKind::Average),
            other => Err(ProcessorError::Configuration {
                source: format!("unknown reducer '{}'", other).into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn window() -> WindowBounds {
        WindowBounds::new(at(0), at(60_000))
    }

    fn reading(speed: f64, millis: i64) -> Datum {
        Datum::new(json!({"speed": speed}).to_string(), at(millis)).with_keys(["car", "red"])
    }

    #[test]
    fn test_reducer_kind_parse() {
        assert_eq!("COMPUTE_AVERAGE_UDF".parse::<ReducerKind>().unwrap(), ReducerKind::Average);
        assert!("sum".parse::<ReducerKind>().is_err());
        for kind in ReducerKind::ALL {
            assert_eq!(kind.to_string().parse::<ReducerKind>().unwrap(), kind);
            assert_eq!(kind.build().name(), kind.as_str());
        }
    }

    #[tokio::test]
    async fn test_reduce_over_channel() {
        let (tx, rx) = mpsc::channel(4);
        let reducer = ReducerKind::Average.build();
        let keys = vec!["car".to_string(), "red".to_string()];

        let handle = tokio::spawn(async move {
            reducer
                .reduce(keys, window(), ReceiverStream::new(rx).boxed())
                .await
        });

        for (speed, millis) in [(50.0, 1_000), (70.0, 2_000), (90.0, 59_999)] {
            tx.send(reading(speed, millis)).await.unwrap();
        }
        drop(tx);

        let out = handle.await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].keys(), &["car".to_string(), "red".to_string()]);

        let value: Value = serde_json::from_slice(out[0].value()).unwrap();
        assert_eq!(value["vehicles_count"], 3);
        assert_eq!(value["avg_speed"], 70.0);
        assert_eq!(value["timestamp"], 0);
    }

    #[tokio::test]
    async fn test_reduce_over_batch() {
        let reducer = WindowReducer::<AverageSpeed>::new();
        let inputs = futures::stream::iter(vec![reading(10.0, 0), reading(30.0, 60_000)]);

        let envelope = reducer
            .run(vec!["car".to_string(), "red".to_string()], window(), inputs)
            .await;
        let value: Value = serde_json::from_slice(envelope.value()).unwrap();
        assert_eq!(value["vehicles_count"], 1);
        assert_eq!(value["avg_speed"], 10.0);
    }

    #[tokio::test]
    async fn test_empty_stream_emits_one_envelope() {
        let reducer = ReducerKind::Aggr.build();
        let out = reducer
            .reduce(
                vec!["Paesano".to_string()],
                window(),
                futures::stream::empty::<Datum>().boxed(),
            )
            .await;

        assert_eq!(out.len(), 1);
        let value: Value = serde_json::from_slice(out[0].value()).unwrap();
        assert_eq!(value["restaurant_name"], "Paesano");
        assert_eq!(value["order_count"], 0);
        assert_eq!(value["total_amount"], 0.0);
    }
}
