//! HTTP server implementation.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::router;
use crate::error::Result;
use crate::ratelimit::RateLimiterBackend;

/// HTTP server for the admission endpoint.
pub struct HttpServer<R: RateLimiterBackend + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The rate limiter instance
    rate_limiter: Arc<R>,
    /// How long open connections may delay shutdown once signalled
    shutdown_timeout: Duration,
}

/// Default grace period for open connections after the shutdown signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

impl<R: RateLimiterBackend + 'static> HttpServer<R> {
    /// Create a new HTTP server backed by `rate_limiter`.
    pub fn new(addr: SocketAddr, rate_limiter: Arc<R>) -> Self {
        Self {
            addr,
            rate_limiter,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the grace period granted to open connections after the signal.
    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            error!(addr = %self.addr, error = %e, "Failed to bind HTTP listener");
            e
        })?;
        self.serve_on(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// In-flight requests may finish for up to the shutdown timeout after
    /// the signal; connections still open past that are abandoned.
    pub async fn serve_on<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.rate_limiter);

        info!(
            addr = %listener.local_addr()?,
            "Starting HTTP server with graceful shutdown"
        );

        let (signalled_tx, signalled_rx) = oneshot::channel();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                let _ = signalled_tx.send(());
            })
            .into_future();
        tokio::pin!(server);

        let result = tokio::select! {
            biased;
            result = &mut server => result,
            _ = signalled_rx => {
                info!(
                    timeout = ?self.shutdown_timeout,
                    "Shutdown signal received, draining connections"
                );
                match tokio::time::timeout(self.shutdown_timeout, &mut server).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            timeout = ?self.shutdown_timeout,
                            "Connections still open after shutdown timeout, stopping anyway"
                        );
                        Ok(())
                    }
                }
            }
        };

        result.map_err(|e| {
            error!(error = %e, "HTTP server failed");
            e
        })?;

        info!("HTTP server stopped");
        Ok(())
    }
}
