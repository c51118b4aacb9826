//! Periodic expiry sweep over live quotes.
//!
//! Any quote whose validity window (`fecha` + `validez_dias`) has closed is
//! force-moved to `expirado` in a single batched UPDATE. The sweep is the
//! only writer allowed to bypass the transition table (it may take a draft
//! straight to expired). Runs on a fixed interval using
//! `tokio::time::interval`.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use presup_db::repositories::PresupuestoRepo;

/// Run the quote expiry sweep loop.
///
/// Sweeps every `interval_secs` until `cancel` is triggered. Failures are
/// logged and the loop continues; overdue quotes are picked up by the next
/// tick.
pub async fn run(pool: PgPool, interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(interval_secs, "Quote expiry sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Quote expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match PresupuestoRepo::expire_overdue(&pool, Utc::now()).await {
                    Ok(expired) => {
                        if expired > 0 {
                            tracing::info!(expired, "Quote expiry sweep: quotes expired");
                        } else {
                            tracing::debug!("Quote expiry sweep: nothing overdue");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Quote expiry sweep failed");
                    }
                }
            }
        }
    }
}
