use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Best-effort self-ping loop for free-tier hosts that idle the process out.
///
/// Runs forever on a fixed interval, swallows every failure, and never
/// touches Router state. Returns immediately when no `SELF_URL` is set.
/// Shutdown happens with the process (the task is detached).
pub async fn run_self_ping(config: Arc<Config>) {
    let Some(url) = config.self_url.clone() else {
        tracing::debug!("SELF_URL not set, self-ping disabled");
        return;
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.self_ping_timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build self-ping HTTP client");
            return;
        }
    };

    let mut interval = tokio::time::interval(Duration::from_secs(config.self_ping_interval_secs));
    // The first tick fires immediately; that first ping doubles as a
    // startup reachability check.
    loop {
        interval.tick().await;
        match client.get(&url).send().await {
            Ok(response) => {
                tracing::debug!(status = %response.status(), "self-ping ok");
            }
            Err(e) => {
                tracing::debug!(error = %e, "self-ping failed");
            }
        }
    }
}
