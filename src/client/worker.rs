//! A worker that keeps sending requests with randomized pacing.

use rand::Rng;
use std::ops::AddAssign;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::request::{ClientError, HttpClient};
use crate::config::ClientConfig;

/// Pacing settings shared by every worker of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Upper bound for a single request, including connect time
    pub request_timeout: Duration,
    /// Exclusive upper bound of the random pause after each request
    pub max_delay: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            max_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&ClientConfig> for WorkerSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

/// Outcome counts for requests sent by one or more workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub sent: u64,
    pub admitted: u64,
    pub limited: u64,
    pub failed: u64,
}

impl WorkerStats {
    fn record(&mut self, outcome: &Result<(), ClientError>) {
        self.sent += 1;
        match outcome {
            Ok(()) => self.admitted += 1,
            Err(ClientError::RateLimited) => self.limited += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.sent += other.sent;
        self.admitted += other.admitted;
        self.limited += other.limited;
        self.failed += other.failed;
    }
}

pub struct Worker {
    id: usize,
    client: HttpClient,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(id: usize, client: HttpClient, settings: WorkerSettings) -> Self {
        Self {
            id,
            client,
            settings,
        }
    }

    /// Send requests until `cancel` fires.
    ///
    /// Each request is bounded by the request timeout and raced against
    /// cancellation, as is the random pause that follows it, so the worker
    /// stops promptly once cancelled.
    pub async fn run(self, cancel: CancellationToken) -> WorkerStats {
        let mut stats = WorkerStats::default();

        debug!(client_id = %self.client.client_id(), worker = self.id, "Starting worker");

        while !cancel.is_cancelled() {
            let attempt =
                tokio::time::timeout(self.settings.request_timeout, self.client.send_request());
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = attempt => result.unwrap_or(Err(ClientError::Timeout)),
            };

            stats.record(&outcome);
            match &outcome {
                Ok(()) => {}
                Err(ClientError::RateLimited) => {
                    debug!(
                        client_id = %self.client.client_id(),
                        worker = self.id,
                        "Request was rate limited"
                    );
                }
                Err(err) => {
                    warn!(
                        client_id = %self.client.client_id(),
                        worker = self.id,
                        error = %err,
                        "Failed to send request"
                    );
                }
            }

            let delay = random_delay(self.settings.max_delay);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(
            client_id = %self.client.client_id(),
            worker = self.id,
            sent = stats.sent,
            limited = stats.limited,
            failed = stats.failed,
            "Stopping worker"
        );
        stats
    }
}

/// Pick a pause uniformly from `[0, max)`.
fn random_delay(max: Duration) -> Duration {
    let max_millis = max.as_millis() as u64;
    if max_millis == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..max_millis))
}
