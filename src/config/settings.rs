//! Tunables for the worker pipeline, retry policy and pane geometry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and geometry knobs, read from the optional `pipeline:` section.
///
/// Every field falls back to its default when omitted, so a config file
/// can override just one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Quiet period before a cursor-driven fetch is sent.
    pub debounce_ms: u64,
    /// Total attempts for a retryable request, first try included.
    pub retry_attempts: u32,
    /// Backoff before the second attempt; doubles after each failure.
    pub retry_base_delay_ms: u64,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout_secs: u64,
    /// Input poll interval of the render loop.
    pub tick_rate_ms: u64,
    /// Smallest share of the screen a pane may shrink to, in percent.
    pub min_pane_percent: u16,
    /// Largest share of the screen a pane may grow to, in percent.
    pub max_pane_percent: u16,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 120,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            request_timeout_secs: 30,
            tick_rate_ms: 100,
            min_pane_percent: 10,
            max_pane_percent: 90,
        }
    }
}

impl PipelineSettings {
    /// Clamp nonsensical values into a usable range.
    pub fn normalized(mut self) -> Self {
        self.retry_attempts = self.retry_attempts.clamp(1, 10);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self.tick_rate_ms = self.tick_rate_ms.clamp(10, 1000);
        self.min_pane_percent = self.min_pane_percent.clamp(5, 45);
        self.max_pane_percent = self
            .max_pane_percent
            .clamp(55, 95)
            .min(100 - self.min_pane_percent);
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}
