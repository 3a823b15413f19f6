//! Graceful shutdown plumbing
//!
//! The admission role runs a background load sampler whose lifecycle is
//! tied to the server's: when the process is told to stop, the sampler
//! must stop too, not linger past the last request. Serving roles hand
//! their background [`CancellationToken`] to [`wait_for_shutdown`] and
//! use the future as axum's graceful-shutdown trigger.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolve on SIGINT or SIGTERM, then cancel `background` so tasks tied
/// to this server's lifecycle stop with it.
pub async fn wait_for_shutdown(background: CancellationToken) {
    wait_for_signal().await;
    info!("shutdown signal received, stopping background tasks");
    background.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable, watching Ctrl+C only: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
