//! Limiter configuration and validated overrides.
//!
//! A limiter starts from safe defaults and accepts a fixed set of
//! recognized overrides. Each override carries its own validation rule and
//! is skipped, with a warning, when the rule fails, so construction can
//! never leave a limiter in an unusable state.

use std::time::Duration;
use tracing::warn;

/// Default number of admitted requests per window.
pub const DEFAULT_LIMIT: u64 = 200;
/// Default window width.
pub const DEFAULT_WINDOW_DURATION: Duration = Duration::from_secs(5);
/// Shortest window an override may set.
pub const MIN_WINDOW_DURATION: Duration = Duration::from_millis(100);

/// Configuration for a rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum admitted requests per window
    pub limit: u64,
    /// Width of the counting window
    pub window_duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window_duration: DEFAULT_WINDOW_DURATION,
        }
    }
}

impl RateLimiterConfig {
    /// Apply `options` in order over the defaults.
    pub fn with_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = LimiterOption>,
    {
        let mut config = Self::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }
}

/// A recognized override for [`RateLimiterConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterOption {
    /// Replace the limit; ignored unless positive.
    Limit(i64),
    /// Replace the window duration; ignored below [`MIN_WINDOW_DURATION`].
    Duration(Duration),
}

/// Override the request limit.
pub fn with_limit(limit: i64) -> LimiterOption {
    LimiterOption::Limit(limit)
}

/// Override the window duration.
pub fn with_duration(duration: Duration) -> LimiterOption {
    LimiterOption::Duration(duration)
}

impl LimiterOption {
    /// Apply this override to `config` if it passes validation.
    ///
    /// Returns `true` when the config was changed.
    pub fn apply(&self, config: &mut RateLimiterConfig) -> bool {
        match *self {
            LimiterOption::Limit(limit) if limit > 0 => {
                config.limit = limit as u64;
                true
            }
            LimiterOption::Limit(limit) => {
                warn!(limit, kept = config.limit, "Ignoring non-positive limit override");
                false
            }
            LimiterOption::Duration(duration) if duration >= MIN_WINDOW_DURATION => {
                config.window_duration = duration;
                true
            }
            LimiterOption::Duration(duration) => {
                warn!(
                    duration = ?duration,
                    minimum = ?MIN_WINDOW_DURATION,
                    kept = ?config.window_duration,
                    "Ignoring window duration override below minimum"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.limit, 200);
        assert_eq!(config.window_duration, Duration::from_secs(5));
    }

    #[test]
    fn test_valid_options_applied() {
        let config = RateLimiterConfig::with_options([
            with_limit(100),
            with_duration(Duration::from_secs(10)),
        ]);
        assert_eq!(config.limit, 100);
        assert_eq!(config.window_duration, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_limit_ignored() {
        let config = RateLimiterConfig::with_options([with_limit(-5)]);
        assert_eq!(config, RateLimiterConfig::default());

        let config = RateLimiterConfig::with_options([with_limit(0)]);
        assert_eq!(config.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_short_duration_ignored() {
        let config = RateLimiterConfig::with_options([with_duration(Duration::from_millis(1))]);
        assert_eq!(config, RateLimiterConfig::default());

        let config = RateLimiterConfig::with_options([with_duration(Duration::from_millis(99))]);
        assert_eq!(config.window_duration, DEFAULT_WINDOW_DURATION);
    }

    #[test]
    fn test_minimum_duration_accepted() {
        let config = RateLimiterConfig::with_options([with_duration(MIN_WINDOW_DURATION)]);
        assert_eq!(config.window_duration, Duration::from_millis(100));
    }

    #[test]
    fn test_options_apply_in_order() {
        // Later valid override wins
        let config = RateLimiterConfig::with_options([with_limit(10), with_limit(20)]);
        assert_eq!(config.limit, 20);

        // Invalid later override keeps the earlier one, not the default
        let config = RateLimiterConfig::with_options([with_limit(10), with_limit(-1)]);
        assert_eq!(config.limit, 10);

        let config = RateLimiterConfig::with_options([
            with_duration(Duration::from_secs(1)),
            with_duration(Duration::from_millis(5)),
        ]);
        assert_eq!(config.window_duration, Duration::from_secs(1));
    }

    #[test]
    fn test_apply_reports_outcome() {
        let mut config = RateLimiterConfig::default();
        assert!(with_limit(3).apply(&mut config));
        assert!(!with_limit(-3).apply(&mut config));
        assert!(!with_duration(Duration::ZERO).apply(&mut config));
        assert_eq!(config.limit, 3);
    }
}
