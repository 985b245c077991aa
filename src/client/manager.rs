//! Owns the pool of workers sending requests for one client id.

use futures::future::join_all;
use reqwest::Url;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::request::HttpClient;
use super::worker::{Worker, WorkerSettings, WorkerStats};

/// Spawns workers for one client id and stops them on shutdown.
pub struct WorkerManager {
    client_id: String,
    url: Url,
    settings: WorkerSettings,
    /// Cancels every worker spawned by this manager
    cancel: CancellationToken,
    workers: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerManager {
    pub fn new(url: Url, client_id: impl Into<String>, settings: WorkerSettings) -> Self {
        Self {
            client_id: client_id.into(),
            url,
            settings,
            cancel: CancellationToken::new(),
            workers: Vec::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Number of workers spawned so far.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Spawn `count` workers, each on its own task.
    ///
    /// Workers share one connection pool and run until [`shutdown`](Self::shutdown).
    pub fn spawn_workers(&mut self, count: usize) {
        info!(client_id = %self.client_id, count, "Starting workers");

        let http = reqwest::Client::new();
        for _ in 0..count {
            let id = self.workers.len();
            let client = HttpClient::with_client(http.clone(), &self.url, self.client_id.clone());
            let worker = Worker::new(id, client, self.settings);
            self.workers.push(tokio::spawn(worker.run(self.cancel.child_token())));
        }
    }

    /// Cancel every worker and wait for all of them to finish.
    ///
    /// Returns the combined request counts.
    pub async fn shutdown(self) -> WorkerStats {
        info!(client_id = %self.client_id, "Shutting down workers");
        self.cancel.cancel();

        let mut total = WorkerStats::default();
        for result in join_all(self.workers).await {
            match result {
                Ok(stats) => total += stats,
                Err(e) => error!(client_id = %self.client_id, error = %e, "Worker task failed"),
            }
        }

        info!(
            client_id = %self.client_id,
            sent = total.sent,
            admitted = total.admitted,
            limited = total.limited,
            failed = total.failed,
            "Workers stopped"
        );
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub::spawn_stub;
    use axum::http::StatusCode;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn fast_settings() -> WorkerSettings {
        WorkerSettings {
            request_timeout: Duration::from_secs(1),
            max_delay: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let stub = spawn_stub(StatusCode::NO_CONTENT, "1").await;
        let mut manager = WorkerManager::new(stub.url.clone(), "1", fast_settings());

        manager.spawn_workers(4);
        assert_eq!(manager.worker_count(), 4);

        tokio::time::sleep(Duration::from_millis(300)).await;

        let stats = tokio::time::timeout(Duration::from_secs(2), manager.shutdown())
            .await
            .expect("workers did not stop");
        assert!(stats.sent >= 4);
        assert_eq!(stats.failed, 0);
        assert!(stub.hits.load(Ordering::SeqCst) as u64 >= stats.sent);
    }

    #[tokio::test]
    async fn test_shutdown_without_workers() {
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let manager = WorkerManager::new(url, "1", WorkerSettings::default());

        assert_eq!(manager.client_id(), "1");
        assert_eq!(manager.shutdown().await, WorkerStats::default());
    }
}
