use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gatekeeper::config::{GatekeeperConfig, LogFormat};
use gatekeeper::http::HttpServer;
use gatekeeper::ratelimit::{
    with_duration, with_limit, RateLimiter, RateLimiterBackend, RateLimiterConfig,
    ShardedRateLimiter,
};
use gatekeeper::telemetry::{init_tracing, shutdown_signal};

/// Per-client rate limiting HTTP service.
#[derive(Parser, Debug)]
#[command(name = "gatekeeper", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Maximum requests per client per window (ignored unless positive)
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,

    /// Window width in milliseconds (ignored below 100)
    #[arg(long)]
    window_ms: Option<u64>,

    /// Use the sharded limiter
    #[arg(long)]
    sharded: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = GatekeeperConfig::load(args.config.as_deref())?;

    let log_format = if args.json_logs {
        LogFormat::Json
    } else {
        config.server.log_format
    };
    init_tracing(log_format);

    info!("Starting Gatekeeper Rate Limiting Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Command line overrides are applied after the file, so they win when valid
    let mut options = config.rate_limiting.limiter_options();
    options.extend(args.limit.map(with_limit));
    options.extend(args.window_ms.map(|ms| with_duration(Duration::from_millis(ms))));

    let addr = args.addr.unwrap_or(config.server.http_addr);
    let shutdown_timeout = Duration::from_millis(config.server.shutdown_timeout_ms);

    if args.sharded || config.server.sharded {
        let limiter = ShardedRateLimiter::new(options);
        log_limiter("sharded", limiter.config());
        serve(addr, shutdown_timeout, Arc::new(limiter)).await?;
    } else {
        let limiter = RateLimiter::new(options);
        log_limiter("single-lock", limiter.config());
        serve(addr, shutdown_timeout, Arc::new(limiter)).await?;
    }

    info!("Gatekeeper Rate Limiting Service stopped");
    Ok(())
}

fn log_limiter(variant: &str, config: &RateLimiterConfig) {
    info!(
        variant,
        limit = config.limit,
        window = ?config.window_duration,
        "Rate limiter initialized"
    );
}

async fn serve<R: RateLimiterBackend + 'static>(
    addr: SocketAddr,
    shutdown_timeout: Duration,
    limiter: Arc<R>,
) -> anyhow::Result<()> {
    HttpServer::new(addr, limiter)
        .with_shutdown_timeout(shutdown_timeout)
        .serve_with_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
