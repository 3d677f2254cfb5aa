//! HTTP API entry point.

use anyhow::Result;
use tracing::info;

use shopgraph::config::Config;
use shopgraph::graph::GraphClient;
use shopgraph::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Recommendation API starting...");

    let config = Config::from_env()?;
    let graph = GraphClient::connect(&config.neo4j).await?;
    info!("✅ Connected to Neo4j");

    server::run_server(graph, &config.bind_addr()).await
}
