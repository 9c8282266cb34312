use mock_service::MockService;
use stampede::prelude::*;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("stampede=info,mock_service=info")
        .init();

    let base_url = match std::env::var("ORDERS_URL") {
        Ok(url) => url,
        Err(_) => format!("http://{}", MockService::default().spawn().await?),
    };

    let workload = stampede::orders::stress_workload(&base_url)?;
    let report = LoadTest::new("orders-stress", workload)
        .tiers(&[1, 10, 100, 1000, 5000, 10000])
        .await?;

    println!("{report}");
    Ok(())
}
