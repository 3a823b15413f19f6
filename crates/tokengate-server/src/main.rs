//! tokengate-server entry point
//!
//! One binary, three serving roles selected by subcommand, mirroring
//! how the limiter is deployed: the admission surface, the policy admin
//! surface, and the cache refresh surface each run as their own
//! process against the same stores.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokengate::prelude::*;
use tokengate_server::{admin, admission, refresh, shutdown};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tokengate-server",
    version,
    about = "Distributed token-bucket rate limiter services"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Debug, Subcommand)]
enum Role {
    /// Serve the admission surface
    Admission,
    /// Serve the policy admin surface
    Admin {
        /// Apply the schema migration before serving
        #[arg(long)]
        migrate: bool,
    },
    /// Serve the cache refresh surface
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.role {
        Role::Admission => run_admission(config).await,
        Role::Admin { migrate } => run_admin(config, migrate).await,
        Role::Refresh => run_refresh(config).await,
    }
}

async fn run_admission(config: Config) -> Result<()> {
    let policies = PgPolicyStore::connect(&config.policy_db).await?;
    let buckets = RedisBucketStore::connect(&config.bucket_store.address).await?;
    probe_backends(&policies, &buckets).await;

    if config.limiter.dynamic_enabled {
        info!("dynamic rate limiting is ENABLED");
    } else {
        info!("dynamic rate limiting is DISABLED");
    }

    let load = Arc::new(LoadCell::new());
    let sampler = LoadSampler::new(load.clone(), config.limiter.load_sample_period());
    let sampler_shutdown = sampler.shutdown_token();
    let sampler_handle = sampler.spawn();

    let engine = LimiterEngine::new(policies, buckets, load, config.limiter.dynamic_enabled);
    let service = AdmissionService::new(engine, config.admission.deadline());

    // The shutdown path cancels the sampler's token, so the sampling
    // loop stops with the listener and the join below cannot hang.
    let result = serve(
        &config.admission.listen_address,
        admission::router(service),
        "admission",
        sampler_shutdown.clone(),
    )
    .await;

    sampler_shutdown.cancel();
    let _ = sampler_handle.await;
    result
}

async fn run_admin(config: Config, migrate: bool) -> Result<()> {
    let store = PgPolicyStore::connect(&config.policy_db).await?;
    if migrate || config.policy_db.auto_migrate {
        store.migrate().await?;
    }
    if let Err(e) = store.ping().await {
        warn!("policy database probe failed: {e}");
    }

    serve(
        &config.admin.listen_address,
        admin::router(store),
        "admin",
        CancellationToken::new(),
    )
    .await
}

async fn run_refresh(config: Config) -> Result<()> {
    let policies = PgPolicyStore::connect(&config.policy_db).await?;
    let buckets = RedisBucketStore::connect(&config.bucket_store.address).await?;
    probe_backends(&policies, &buckets).await;

    let refresher = CacheRefresher::new(policies, buckets);
    serve(
        &config.refresh.listen_address,
        refresh::router(refresher),
        "refresh",
        CancellationToken::new(),
    )
    .await
}

/// Connectivity probes at boot: log the outcome, keep serving either
/// way. A store that is down at startup may be up by the first request.
async fn probe_backends(policies: &PgPolicyStore, buckets: &RedisBucketStore) {
    match policies.ping().await {
        Ok(()) => info!("policy database reachable"),
        Err(e) => warn!("policy database probe failed: {e}"),
    }
    match buckets.ping().await {
        Ok(()) => info!("bucket store reachable"),
        Err(e) => warn!("bucket store probe failed: {e}"),
    }
}

async fn serve(
    address: &str,
    router: axum::Router,
    role: &str,
    background: CancellationToken,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|e| LimiterError::Configuration(format!("failed to bind {address}: {e}")))?;
    info!("{role} server listening on {address}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown::wait_for_shutdown(background))
        .await
        .map_err(|e| LimiterError::Internal(e.to_string()))
}
