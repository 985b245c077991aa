//! Sharded rate limiter.
//!
//! Same admission contract as [`RateLimiter`](super::RateLimiter), but the
//! key map is split into independently locked shards. Calls for one key are
//! still serialized by the shard lock held across the entry update; calls
//! for keys in different shards run in parallel.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Instant;
use tracing::{debug, trace};

use super::backend::RateLimiterBackend;
use super::counter::WindowState;
use super::options::{LimiterOption, RateLimiterConfig};

/// A fixed-window rate limiter with per-shard locking.
#[derive(Debug)]
pub struct ShardedRateLimiter {
    config: RateLimiterConfig,
    windows: DashMap<String, WindowState>,
}

impl ShardedRateLimiter {
    /// Create a sharded limiter from the defaults and the given overrides.
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = LimiterOption>,
    {
        Self::from_config(RateLimiterConfig::with_options(options))
    }

    /// Create a sharded limiter from an explicit, unvalidated configuration.
    pub fn from_config(config: RateLimiterConfig) -> Self {
        debug!(
            limit = config.limit,
            window = ?config.window_duration,
            "Creating sharded rate limiter"
        );
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Get the configuration in effect.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Count a request for `key` and report whether it must be rejected.
    pub fn is_limited(&self, key: &str) -> bool {
        let now = Instant::now();

        let limited = match self.windows.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                occupied
                    .get_mut()
                    .admit(now, self.config.limit, self.config.window_duration)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(WindowState::new(now));
                false
            }
        };

        trace!(key, limited, "Checked rate limit");
        limited
    }

    /// Get the stored request count for a key.
    pub fn request_count(&self, key: &str) -> Option<u64> {
        self.windows.get(key).map(|state| state.request_count())
    }

    /// Get the number of tracked keys.
    pub fn key_count(&self) -> usize {
        self.windows.len()
    }

    /// Forget every key.
    pub fn clear(&self) {
        self.windows.clear();
    }
}

impl Default for ShardedRateLimiter {
    fn default() -> Self {
        Self::new([])
    }
}

impl RateLimiterBackend for ShardedRateLimiter {
    fn is_limited(&self, key: &str) -> bool {
        ShardedRateLimiter::is_limited(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::options::{with_duration, with_limit};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_admission_boundary() {
        let limiter = ShardedRateLimiter::new([with_limit(5)]);

        for _ in 0..5 {
            assert!(!limiter.is_limited("1"));
        }
        assert!(limiter.is_limited("1"));
        assert_eq!(limiter.request_count("1"), Some(6));
    }

    #[test]
    fn test_window_rollover() {
        let window = Duration::from_millis(100);
        let limiter = ShardedRateLimiter::new([with_limit(1), with_duration(window)]);

        assert!(!limiter.is_limited("1"));
        assert!(limiter.is_limited("1"));

        thread::sleep(window + Duration::from_millis(50));

        assert!(!limiter.is_limited("1"));
        assert_eq!(limiter.request_count("1"), Some(1));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = ShardedRateLimiter::new([with_limit(1)]);

        limiter.is_limited("A");
        assert!(limiter.is_limited("A"));
        assert!(!limiter.is_limited("B"));
        assert_eq!(limiter.key_count(), 2);

        limiter.clear();
        assert_eq!(limiter.key_count(), 0);
    }

    #[test]
    fn test_invalid_options_keep_defaults() {
        let limiter =
            ShardedRateLimiter::new([with_limit(-5), with_duration(Duration::from_millis(1))]);
        assert_eq!(*limiter.config(), RateLimiterConfig::default());
    }

    #[test]
    fn test_from_config_skips_validation() {
        let limiter = ShardedRateLimiter::from_config(RateLimiterConfig {
            limit: 0,
            window_duration: Duration::from_millis(50),
        });
        assert_eq!(limiter.config().limit, 0);
        assert_eq!(limiter.config().window_duration, Duration::from_millis(50));

        // A zero limit still admits the first request of a window
        assert!(!limiter.is_limited("1"));
        assert!(limiter.is_limited("1"));
    }

    #[test]
    fn test_concurrent_admission_is_exact() {
        const THREADS: usize = 64;
        const CALLS: usize = 10;
        const LIMIT: u64 = 250;

        let limiter = Arc::new(ShardedRateLimiter::new([
            with_limit(LIMIT as i64),
            with_duration(Duration::from_secs(60)),
        ]));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                thread::spawn(move || {
                    for _ in 0..CALLS {
                        if !limiter.is_limited("shared") {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), LIMIT as usize);
        assert_eq!(limiter.request_count("shared"), Some((THREADS * CALLS) as u64));
    }
}
