//! Per-key fixed-window state.

use std::time::{Duration, Instant};

/// Request count for one client key within its current window.
///
/// The state itself is not synchronized; limiters hold it behind a lock and
/// call [`WindowState::admit`] inside the critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Requests counted in the current window, including the one that opened it
    request_count: u64,
    /// When the current window started
    window_start: Instant,
}

impl WindowState {
    /// Open a new window at `now` holding one request.
    pub fn new(now: Instant) -> Self {
        Self {
            request_count: 1,
            window_start: now,
        }
    }

    /// Get the current count.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Get the start of the current window.
    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    /// Whether the window opened at `window_start` is over at `now`.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) > window
    }

    /// Count one request at `now` and decide whether it is over the limit.
    ///
    /// Returns `true` if the request must be rejected. An expired window is
    /// replaced by a fresh one before anything is compared.
    pub fn admit(&mut self, now: Instant, limit: u64, window: Duration) -> bool {
        if self.is_expired(now, window) {
            *self = Self::new(now);
            return false;
        }

        let previous = self.request_count;
        self.request_count = previous.saturating_add(1);
        previous >= limit
    }
}
