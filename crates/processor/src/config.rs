//! Configuration types for the stage processor
//!
//! Covers the knobs the stages themselves read: the content router's
//! allow-list and the local pipeline runner's windowing and buffering.

use crate::error::{ProcessorError, Result};
use serde::{Deserialize, Serialize};

/// Largest accepted tumbling window: one week
pub const MAX_WINDOW_SIZE_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Main processor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessorConfig {
    /// Content router configuration
    #[serde(default)]
    pub router: RouterConfig,

    /// Local pipeline runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl ProcessorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.router.validate()?;
        self.runner.validate()?;
        Ok(())
    }
}

/// Content router configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterConfig {
    /// Animals accepted in a JSON routing request; each becomes a tag
    #[serde(default = "default_allowed_animals")]
    pub allowed_animals: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            allowed_animals: default_allowed_animals(),
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.allowed_animals.is_empty() {
            return Err(ProcessorError::Configuration {
                source: "allowed_animals must not be empty".into(),
            });
        }

        if let Some(blank) = self.allowed_animals.iter().find(|a| a.trim().is_empty()) {
            return Err(ProcessorError::Configuration {
                source: format!("allowed_animals contains a blank entry: {:?}", blank).into(),
            });
        }

        Ok(())
    }
}

/// Local pipeline runner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// Tumbling window size in milliseconds
    #[serde(default = "default_window_size_ms")]
    pub window_size_ms: u64,

    /// Capacity of the channel feeding each reducer invocation
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            window_size_ms: default_window_size_ms(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_size_ms == 0 {
            return Err(ProcessorError::Configuration {
                source: "window_size_ms must be greater than 0".into(),
            });
        }

        if self.window_size_ms > MAX_WINDOW_SIZE_MS {
            return Err(ProcessorError::Configuration {
                source: format!(
                    "window_size_ms must be at most {} (one week), got {}",
                    MAX_WINDOW_SIZE_MS, self.window_size_ms
                )
                .into(),
            });
        }

        if self.channel_buffer == 0 {
            return Err(ProcessorError::Configuration {
                source: "channel_buffer must be greater than 0".into(),
            });
        }

        Ok(())
    }

    pub fn window_size(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.window_size_ms as i64)
    }
}

fn default_allowed_animals() -> Vec<String> {
    vec!["tiger".to_string(), "dog".to_string(), "elephant".to_string()]
}

fn default_window_size_ms() -> u64 {
    60_000
}

fn default_channel_buffer() -> usize {
    500
}
