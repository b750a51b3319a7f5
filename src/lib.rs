use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod blocklist;
pub mod config;
pub mod directory;
pub mod error;
pub mod health;
pub mod metrics;
pub mod relay_map;
pub mod router;
pub mod transport;
pub mod types;
pub mod uptime;
pub mod utils;

use config::Config;
use router::Router;
use transport::{TelegramTransport, Transport};

/// Pull updates forever and hand each one to the Router in its own task, so
/// one user's slow flow never stalls another's. Poll failures back off and
/// retry; the offset acknowledges processed updates to the API.
pub async fn run_update_loop(transport: Arc<TelegramTransport>, router: Arc<Router>) {
    let mut offset: i64 = 0;
    loop {
        let updates = match transport.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, backing off");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            metrics::UPDATES_RECEIVED_TOTAL.inc();

            let Some(inbound) = update.into_inbound() else {
                continue;
            };
            let router = router.clone();
            tokio::spawn(async move {
                if let Err(e) = router.handle(inbound).await {
                    e.log();
                }
            });
        }
    }
}

pub async fn run() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; missing BOT_TOKEN or ADMIN_ID refuses startup here.
    let config = Arc::new(Config::from_env()?);

    let transport =
        Arc::new(TelegramTransport::new(&config).context("failed to build Bot API client")?);

    // Fail fast on a bad credential instead of polling into 401s.
    let me = transport
        .get_me()
        .await
        .context("Bot API credential check failed")?;
    tracing::info!(
        bot = %me.username.as_deref().unwrap_or(&me.first_name),
        "Connected to Bot API"
    );

    let dyn_transport: Arc<dyn Transport> = transport.clone();
    let router = Arc::new(Router::new(dyn_transport, config.clone()));

    // Background loops: liveness endpoint and best-effort self-ping. Both
    // end with the process.
    tokio::spawn(uptime::run_self_ping(config.clone()));
    let http_server = health::run_http_server(config.port);
    let update_loop = run_update_loop(transport, router);

    tracing::info!("Relay gateway running");

    tokio::select! {
        _ = update_loop => {
            tracing::info!("Update loop shut down.");
        },
        res = http_server => {
            if let Err(e) = res {
                tracing::error!("HTTP server failed: {}", e);
            }
        },
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, exiting");
        }
    }

    Ok(())
}
