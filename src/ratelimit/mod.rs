//! Fixed-window rate limiting logic and state management.

mod backend;
mod counter;
mod limiter;
mod options;
mod sharded;

pub use backend::RateLimiterBackend;
pub use counter::WindowState;
pub use limiter::RateLimiter;
pub use options::{
    with_duration, with_limit, LimiterOption, RateLimiterConfig, DEFAULT_LIMIT,
    DEFAULT_WINDOW_DURATION, MIN_WINDOW_DURATION,
};
pub use sharded::ShardedRateLimiter;
