//! ETL entry point: one full wipe-and-reload of the product graph.

use anyhow::Result;
use tracing::info;

use shopgraph::config::Config;
use shopgraph::connect::{self, RetryPolicy};
use shopgraph::{extract, load, schema};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 ETL pipeline starting...");

    let config = Config::from_env()?;
    let policy = RetryPolicy::default();

    // Both stores must be reachable before anything else happens. This is
    // a blocking pre-flight check with a hard attempt ceiling.
    let pg = connect::wait_for_postgres(&config.postgres, &policy).await?;
    let graph = connect::wait_for_neo4j(&config.neo4j, &policy).await?;

    schema::initialize_schema(&graph).await?;

    info!("Extracting data from PostgreSQL...");
    let data = extract::extract_all(&pg).await?;

    load::load_graph(&graph, &data, None).await?;
    load::verify_counts(&graph, &data).await?;

    info!("✅ ETL done.");
    Ok(())
}
