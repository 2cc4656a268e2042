//! Window assigners
//!
//! Used by the local pipeline runner to stand in for the runtime's window
//! boundary detection.

use super::types::{Window, WindowBounds};
use crate::error::{WindowError, WindowResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fmt;

/// Trait for assigning events to windows
pub trait WindowAssigner: Send + Sync + fmt::Debug {
    /// Assign a timestamp to one or more windows
    fn assign_windows(&self, timestamp: DateTime<Utc>) -> WindowResult<Vec<Window>>;
}

/// Tumbling window assigner
///
/// Creates fixed-size, non-overlapping windows. Each event is assigned to
/// exactly one window based on its timestamp.
///
/// # Example
/// ```text
/// Window size: 5 seconds
/// Event at timestamp 7 -> Window [5, 10)
/// Event at timestamp 12 -> Window [10, 15)
/// ```
#[derive(Debug, Clone)]
pub struct TumblingWindowAssigner {
    /// Size of each window
    size: Duration,
}

impl TumblingWindowAssigner {
    /// Create a new tumbling window assigner
    pub fn new(size: Duration) -> WindowResult<Self> {
        if size <= Duration::zero() {
            return Err(WindowError::InvalidWindowSize {
                size: size.num_milliseconds().max(0) as u64,
            });
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> Duration {
        self.size
    }

    /// Calculate the window start for a given timestamp
    fn window_start(&self, timestamp: DateTime<Utc>) -> WindowResult<DateTime<Utc>> {
        let ts_millis = timestamp.timestamp_millis();
        let size_millis = self.size.num_milliseconds();
        let aligned = ts_millis.div_euclid(size_millis) * size_millis;

        Utc.timestamp_millis_opt(aligned)
            .single()
            .ok_or_else(|| WindowError::InvalidTimestamp {
                timestamp: ts_millis,
                reason: "aligned window start is out of range".to_string(),
            })
    }
}

impl WindowAssigner for TumblingWindowAssigner {
    fn assign_windows(&self, timestamp: DateTime<Utc>) -> WindowResult<Vec<Window>> {
        let start = self.window_start(timestamp)?;
        let end = start
            .checked_add_signed(self.size)
            .ok_or_else(|| WindowError::InvalidTimestamp {
                timestamp: timestamp.timestamp_millis(),
                reason: "window end is out of range".to_string(),
            })?;
        let bounds = WindowBounds::try_new(start, end)?;
        Ok(vec![Window::new(bounds)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_timestamp(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_tumbling_window_assignment() {
        let assigner = TumblingWindowAssigner::new(Duration::milliseconds(5000)).unwrap();

        let windows = assigner.assign_windows(create_timestamp(7000)).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].bounds.start, create_timestamp(5000));
        assert_eq!(windows[0].bounds.end, create_timestamp(10000));

        let windows = assigner.assign_windows(create_timestamp(10000)).unwrap();
        assert_eq!(windows[0].bounds.start, create_timestamp(10000));
    }

    #[test]
    fn test_tumbling_window_before_epoch() {
        let assigner = TumblingWindowAssigner::new(Duration::milliseconds(1000)).unwrap();
        let windows = assigner.assign_windows(create_timestamp(-1)).unwrap();
        assert_eq!(windows[0].bounds.start, create_timestamp(-1000));
        assert_eq!(windows[0].bounds.end, create_timestamp(0));
    }

    #[test]
    fn test_tumbling_window_end_out_of_range() {
        let assigner = TumblingWindowAssigner::new(Duration::seconds(60)).unwrap();
        let err = assigner.assign_windows(DateTime::<Utc>::MAX_UTC).unwrap_err();
        assert!(matches!(err, WindowError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_tumbling_huge_size_does_not_panic() {
        let assigner = TumblingWindowAssigner::new(Duration::milliseconds(i64::MAX)).unwrap();
        assert!(assigner.assign_windows(create_timestamp(1_000)).is_err());
    }

    #[test]
    fn test_tumbling_invalid_size() {
        let err = TumblingWindowAssigner::new(Duration::zero()).unwrap_err();
        assert!(matches!(err, WindowError::InvalidWindowSize { size: 0 }));
    }
}
