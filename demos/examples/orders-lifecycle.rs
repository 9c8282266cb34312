use mock_service::{MockConfig, MockService};
use stampede::prelude::*;
use std::num::NonZeroU32;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("stampede=debug,mock_service=info")
        .init();

    // Limited to 2000 requests per second, so larger tiers start to see 503s.
    let service = MockService::new(MockConfig {
        max_tps: NonZeroU32::new(2_000),
        ..Default::default()
    });
    let base_url = format!("http://{}", service.clone().spawn().await?);

    let workload = stampede::orders::lifecycle_workload(&base_url)?;
    let report = LoadTest::new("orders-lifecycle", workload)
        .tiers(&[10, 100, 500])
        .success_rate(0.8)
        .await?;

    println!("{}", report.summarize());
    println!("{} requests served", service.requests());
    Ok(())
}
