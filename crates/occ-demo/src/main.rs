//! Optimistic concurrency demo entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use occ_demo::{run_demo, Cli, Loader};
use occ_demo_core::DemoConfig;
use occ_demo_store::{DynamoDbConfig, DynamoStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,occ_demo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration from environment, then apply flags
    let mut config = DemoConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    let dynamo_config = DynamoDbConfig::new(config.table_name.clone()).with_env_overrides();
    tracing::info!(
        table = %dynamo_config.table_name,
        endpoint = ?dynamo_config.endpoint,
        key = %config.target_key(),
        workers = config.workers,
        writes_per_worker = config.writes_per_worker,
        backoff = ?config.backoff,
        "Configuration loaded"
    );

    let store = DynamoStore::from_env(dynamo_config).await;

    if cli.load {
        tracing::info!("Loading table with data");
        if cli.create_table {
            store.ensure_table().await?;
        }
        let keys = Loader::new(&store).load_config(&config).await?;
        tracing::info!(count = keys.len(), "Table loaded");
        return Ok(());
    }

    let report = run_demo(store, &config, cli.mode()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}
