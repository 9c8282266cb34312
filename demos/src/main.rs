use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use stampede::prelude::*;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::FmtSubscriber;

/// Run a load plan described in TOML and report whether every tier passed.
#[derive(Parser, Debug)]
#[command(version = "0.1")]
struct Cli {
    /// Path to the plan file.
    plan: PathBuf,

    /// Override the plan's tiers, e.g. `-t 1 -t 10 -t 100`.
    #[arg(short, long)]
    tiers: Vec<usize>,

    /// Print the summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Expose Prometheus metrics on this address while the run lasts.
    #[arg(long)]
    metrics: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("stampede=info")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("installing the Prometheus exporter")?;
    }

    let source = std::fs::read_to_string(&cli.plan)
        .with_context(|| format!("reading {}", cli.plan.display()))?;
    let plan = LoadPlan::from_toml(&source)?;

    let mut config = plan.load_test_config();
    if !cli.tiers.is_empty() {
        config.tiers = cli.tiers.clone();
    }

    let workload = Arc::new(HttpWorkload::from_plan(&plan)?);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling the run");
            on_ctrl_c.cancel();
        }
    });

    let report = LoadTest::with_config(workload, config)
        .cancel_on(cancel)
        .await?;

    let summary = report.summarize();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }

    if !summary.overall_passed {
        std::process::exit(1);
    }
    Ok(())
}
