use clap::Parser;
use futures::future::join_all;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use gatekeeper::client::{WorkerManager, WorkerSettings, WorkerStats};
use gatekeeper::config::{GatekeeperConfig, LogFormat};
use gatekeeper::error::GatekeeperError;
use gatekeeper::telemetry::{init_tracing, shutdown_signal};

/// Load generator for the Gatekeeper admission endpoint.
#[derive(Parser, Debug)]
#[command(name = "gatekeeper-load", version, about)]
struct Args {
    /// Admission endpoint, e.g. http://localhost:8080/
    url: String,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of client ids; ids are "1" through N
    #[arg(long)]
    clients: Option<usize>,

    /// Workers per client id
    #[arg(long)]
    workers: Option<usize>,

    /// Exclusive upper bound of the pause between requests, in milliseconds
    #[arg(long)]
    max_delay_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let url = Url::parse(&args.url)
        .map_err(|e| GatekeeperError::InvalidUrl(format!("{}: {e}", args.url)))?;
    let config = GatekeeperConfig::load(args.config.as_deref())?;

    init_tracing(if args.json_logs {
        LogFormat::Json
    } else {
        config.server.log_format
    });

    let mut settings = WorkerSettings::from(&config.client);
    if let Some(ms) = args.max_delay_ms {
        settings.max_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = args.timeout_ms {
        settings.request_timeout = Duration::from_millis(ms);
    }
    let num_clients = args.clients.unwrap_or(config.client.num_clients);
    let num_workers = args.workers.unwrap_or(config.client.num_workers);

    info!(
        url = %url,
        clients = num_clients,
        workers = num_workers,
        "Starting load clients"
    );

    let managers: Vec<WorkerManager> = (1..=num_clients)
        .map(|id| {
            let mut manager = WorkerManager::new(url.clone(), id.to_string(), settings);
            manager.spawn_workers(num_workers);
            manager
        })
        .collect();

    shutdown_signal().await;

    let mut total = WorkerStats::default();
    for stats in join_all(managers.into_iter().map(WorkerManager::shutdown)).await {
        total += stats;
    }

    info!(
        sent = total.sent,
        admitted = total.admitted,
        limited = total.limited,
        failed = total.failed,
        "Load clients stopped"
    );
    Ok(())
}
