//! Core rate limiter implementation.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, trace};

use super::backend::RateLimiterBackend;
use super::counter::WindowState;
use super::options::{LimiterOption, RateLimiterConfig};

/// A fixed-window rate limiter keyed by client id.
///
/// Every key's window lives in one map behind a single mutex, so admission
/// decisions are serialized process-wide. Keys are never evicted; a
/// long-running process holds one entry per distinct client it has seen.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    /// Window state indexed by client key
    windows: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
    /// Create a rate limiter from the defaults and the given overrides.
    ///
    /// Overrides are applied in order; invalid ones are ignored.
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = LimiterOption>,
    {
        Self::from_config(RateLimiterConfig::with_options(options))
    }

    /// Create a rate limiter from an explicit configuration.
    ///
    /// No validation is applied; the caller vouches for the values.
    pub fn from_config(config: RateLimiterConfig) -> Self {
        debug!(
            limit = config.limit,
            window = ?config.window_duration,
            "Creating rate limiter"
        );
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Get the configuration in effect.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Count a request for `key` and report whether it must be rejected.
    pub fn is_limited(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock();

        let limited = match windows.get_mut(key) {
            Some(state) => state.admit(now, self.config.limit, self.config.window_duration),
            None => {
                windows.insert(key.to_owned(), WindowState::new(now));
                false
            }
        };
        drop(windows);

        trace!(key, limited, "Checked rate limit");
        limited
    }

    /// Get the stored request count for a key.
    ///
    /// Returns `None` if the key has never been seen. The count is reported
    /// as stored, even if its window has since expired.
    pub fn request_count(&self, key: &str) -> Option<u64> {
        self.windows.lock().get(key).map(WindowState::request_count)
    }

    /// Get the number of tracked keys.
    pub fn key_count(&self) -> usize {
        self.windows.lock().len()
    }

    /// Forget every key.
    pub fn clear(&self) {
        self.windows.lock().clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new([])
    }
}

impl RateLimiterBackend for RateLimiter {
    fn is_limited(&self, key: &str) -> bool {
        RateLimiter::is_limited(self, key)
    }
}
