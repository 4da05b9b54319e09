use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Settings for talking to the generation service and tracking jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Per-request timeout. Unset means requests may take as long as they need.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    /// Fail the job after this many poll ticks fail in a row. Unset polls forever.
    #[serde(default)]
    pub max_consecutive_poll_failures: Option<u32>,
    /// Fail the job once it has been in progress this long. Unset waits forever.
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_channel_capacity() -> usize {
    100
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: None,
            max_consecutive_poll_failures: None,
            job_timeout_secs: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}
