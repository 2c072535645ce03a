//! # nodestore
//!
//! Main binary for the node data gateway:
//! - loads configuration (`config.toml`, `.env`, `NODESTORE_*` variables)
//! - keeps the access policy current from the production node table
//! - serves `/api/v1/data/...` downloads out of S3 / MinIO

use clap::Parser;
use nodestore_api::{build_router, AppState, DataSettings, Metrics};
use nodestore_common::config::{self, AppConfig};
use nodestore_policy::{Authorizer, Credential, NodeTableClient, Refresher, StaticPolicy};
use nodestore_storage::{S3Config, S3Store};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "nodestore", version, about = "Read-only gateway for node data")]
struct Cli {
    /// Listen address, overrides `server.host` and `server.port`.
    #[arg(long, env = "NODESTORE_ADDR")]
    addr: Option<SocketAddr>,

    /// Config file name, without extension.
    #[arg(long, env = "NODESTORE_CONFIG", default_value = "config")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load(&cli.config)?;

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nodestore=debug,tower_http=info".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("Starting nodestore v{}", env!("CARGO_PKG_VERSION"));

    // === Access policy ===
    let policy = StaticPolicy {
        credentials: credentials(&config)?,
        restricted_task_substrings: config.policy.restricted_task_substrings(),
    };
    if policy.credentials.is_empty() {
        tracing::warn!("No credentials configured, restricted files cannot be downloaded");
    }
    tracing::info!(
        credentials = policy.credentials.len(),
        restricted_tasks = ?policy.restricted_task_substrings,
        "Access policy loaded"
    );

    // Nothing is public until the first node table fetch lands.
    let authorizer = Arc::new(Authorizer::new(policy.initial_config()));
    let node_table =
        NodeTableClient::new(&config.policy.node_table_url, config.policy.fetch_timeout())?;
    tracing::info!("Node table source: {}", node_table.url());
    let _refresher = Refresher::new(
        authorizer.clone(),
        node_table,
        policy,
        config.policy.refresh_interval(),
        config.policy.retry_interval(),
    )
    .spawn();

    // === Object Storage (MinIO / S3) ===
    let store = S3Store::new(&S3Config {
        endpoint: config.storage.endpoint.clone(),
        access_key: config.storage.access_key.clone(),
        secret_key: config.storage.secret_key.clone(),
        bucket: config.storage.bucket.clone(),
        region: config.storage.region.clone(),
        timeout: config.storage.timeout(),
    });
    match store.check_bucket().await {
        Ok(()) => tracing::info!("Object storage ready (bucket: {})", store.bucket()),
        Err(e) => tracing::warn!(bucket = store.bucket(), "Object storage not reachable yet: {e}"),
    }

    // === HTTP ===
    let state = AppState {
        store: Arc::new(store),
        authenticator: authorizer,
        metrics: Metrics::new()?,
        settings: DataSettings {
            root_folder: config.storage.root_folder.clone(),
            download_mode: config.storage.download_mode,
            presign_ttl: config.storage.presign_ttl(),
            auth_domain: config.server.auth_domain.clone(),
        },
    };
    let router = build_router(state);

    let addr = match cli.addr {
        Some(addr) => addr,
        None => SocketAddr::new(config.server.host.parse()?, config.server.port),
    };
    tracing::info!(
        mode = ?config.storage.download_mode,
        "Listening on http://{addr}"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Configured credentials: the `policy.credentials` list plus the legacy
/// `policy.username` / `policy.password` pair.
fn credentials(config: &AppConfig) -> anyhow::Result<Vec<Credential>> {
    let mut credentials = Credential::parse_list(&config.policy.credentials)?;
    if let (Some(user), Some(pass)) = (&config.policy.username, &config.policy.password) {
        if !user.is_empty() && !pass.is_empty() {
            credentials.push(Credential::new(user.as_str(), pass.as_str()));
        }
    }
    Ok(credentials)
}
