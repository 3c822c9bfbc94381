//! Configuration types for the soundtouch-stream crate

use std::time::Duration;

/// Configuration for the WebSocket event stream
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket subprotocol requested during the handshake
    /// Default: "gabbo"
    pub sub_protocol: String,

    /// Maximum time allowed for the handshake
    /// Default: 10 seconds
    pub connect_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sub_protocol: "gabbo".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Configuration for the polling fallback
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Delay between successful polls
    /// Default: 5 seconds
    pub interval: Duration,

    /// Upper bound for the delay after consecutive failures
    /// Default: 60 seconds
    pub max_backoff: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl PollingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polling tuned for quicker state convergence
    pub fn fast_polling() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }

    /// Delay before the next poll after `failures` consecutive failures
    ///
    /// `interval * 2^failures`, capped at `max_backoff`.
    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let factor = 2u32.saturating_pow(failures.min(16));
        self.interval
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff.max(self.interval))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("Polling interval must be greater than 0".to_string());
        }
        if self.max_backoff < self.interval {
            return Err("Maximum backoff must not be shorter than the polling interval".to_string());
        }
        Ok(())
    }
}
