use std::time::Duration;

use anyhow::{Context, Result};
use axum::serve;
use relay_core::{HttpTelegramApi, Relay, RelayConfig};
use relay_telemetry::telemetry_enabled;
use relay_webhook::{AppState, build_router, ensure_webhook};
use tokio::net::TcpListener;
use tracing::{info, warn};

const NOTICE_DRAIN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    relay_telemetry::install("relay-webhook", env!("CARGO_PKG_VERSION"))?;

    let config = RelayConfig::from_env().context("load relay configuration")?;
    let relay = Relay::from_config(&config).context("build relay HTTP client")?;
    let options = relay.options();
    info!(
        config = ?config,
        notify_unauthorized = options.notify_unauthorized,
        legacy_telegram_id = options.include_telegram_id,
        otlp = telemetry_enabled(),
        "relay configured"
    );

    if let Some(url) = &config.webhook_url {
        let api = HttpTelegramApi::new(
            config.http_client().context("build telegram HTTP client")?,
            &config.platform_api_base,
            config.platform_api_token.clone(),
        );
        ensure_webhook(&api, url).await;
    }

    let router = build_router(AppState::new(relay.clone()));
    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("relay-webhook listening on {}", addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    let pending = relay.pending_notices();
    if pending > 0 {
        info!(pending, "waiting for in-flight notices");
    }
    if !relay.drain_notices(NOTICE_DRAIN_GRACE).await {
        warn!(
            pending = relay.pending_notices(),
            "notices still in flight at shutdown"
        );
    }

    Ok(())
}
