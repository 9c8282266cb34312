use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=debug,tower_http=info")),
        )
        .init();

    let addr: SocketAddr = std::env::var("MOCK_SERVICE_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()?;

    tracing::info!("Serving mock orders API on {addr}");
    mock_service::run(addr).await?;
    Ok(())
}
