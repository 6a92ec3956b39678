use anyhow::Result;
use relay_mock_services::{MockConfig, MockState, build_router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    relay_telemetry::install("relay-mock-services", env!("CARGO_PKG_VERSION"))?;

    let config = MockConfig::from_env()?;
    let app = build_router(MockState::new(config.authorized_ids.clone()));
    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(
        authorized = config.authorized_ids.len(),
        "relay-mock-services listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
