//! Windowing module
//!
//! A reducer covers one interval window `[start, end)` handed over by the
//! runtime. Tumbling assignment is provided for the local pipeline runner.
//!
//! ```text
//! Time:     0----5----10---15---20---25---30
//! Windows:  [----][----][----][----][----]
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use processor::window::{TumblingWindowAssigner, WindowAssigner};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let assigner = TumblingWindowAssigner::new(Duration::seconds(60)).unwrap();
//! let windows = assigner
//!     .assign_windows(Utc.timestamp_millis_opt(61_000).unwrap())
//!     .unwrap();
//! assert_eq!(windows[0].bounds.start.timestamp_millis(), 60_000);
//! ```

pub mod assigner;
pub mod types;

pub use assigner::{TumblingWindowAssigner, WindowAssigner};
pub use types::{Window, WindowBounds};
