//! Reconnect backoff schedule
//!
//! **Backoff Strategy:**
//! - Delay before attempt `n` (1-indexed): `min(base * 2^(n-1), max)`
//! - Defaults: base 2000ms, max 60000ms, 5 attempts
//! - After `max_attempts` consecutive failures the transport gives up

use cabinet_common::config::{
    StreamSettings, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY_MS,
    DEFAULT_RECONNECT_MAX_DELAY_MS,
};
use std::time::Duration;

/// Exponential backoff with a bounded attempt budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_RECONNECT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RECONNECT_MAX_DELAY_MS),
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
        }
    }

    pub fn from_settings(settings: &StreamSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.reconnect_base_delay_ms),
            Duration::from_millis(settings.reconnect_max_delay_ms),
            settings.max_reconnect_attempts,
        )
    }

    /// Delay before reconnect attempt `attempt` (1-indexed; 0 is treated as 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let base_ms = self.base_delay.as_millis().min(u128::from(u64::MAX)) as u64;
        let delay_ms = base_ms.saturating_mul(1_u64 << exponent);
        Duration::from_millis(delay_ms).min(self.max_delay)
    }

    /// True once `attempts` consecutive failures have used up the budget
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}
