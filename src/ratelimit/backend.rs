//! Rate limiter trait for abstracting the coarse-locked and sharded implementations.

/// Trait for rate limiter implementations.
///
/// This trait abstracts over both [`RateLimiter`](super::RateLimiter) and
/// [`ShardedRateLimiter`](super::ShardedRateLimiter) so the HTTP front end
/// can work with either.
pub trait RateLimiterBackend: Send + Sync {
    /// Count a request for `key` and report whether it must be rejected.
    ///
    /// `key` must be non-empty; callers validate it before asking.
    fn is_limited(&self, key: &str) -> bool;
}
