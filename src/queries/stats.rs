//! Graph statistics: per-label node counts and relationship count.

use neo4rs::query;
use serde::Serialize;

use crate::error::Result;
use crate::graph::GraphClient;

#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub customers: i64,
    pub products: i64,
    pub orders: i64,
    pub categories: i64,
    pub nodes_total: i64,
    pub relationships: i64,
}

/// Live read of the current graph shape. Never cached; the stats endpoint
/// and the post-load verification both call this.
pub async fn graph_stats(client: &GraphClient) -> Result<GraphStats> {
    let customers = count_label(client, "Customer").await?;
    let products = count_label(client, "Product").await?;
    let orders = count_label(client, "Order").await?;
    let categories = count_label(client, "Category").await?;
    let relationships = count_scalar(client, "MATCH ()-[r]->() RETURN count(r) AS count").await?;

    Ok(GraphStats {
        customers,
        products,
        orders,
        categories,
        nodes_total: customers + products + orders + categories,
        relationships,
    })
}

async fn count_label(client: &GraphClient, label: &str) -> Result<i64> {
    // Labels cannot be parameterized; `label` is one of the four fixed
    // node labels above, never caller input.
    let cypher = format!("MATCH (n:{label}) RETURN count(n) AS count");
    count_scalar(client, &cypher).await
}

async fn count_scalar(client: &GraphClient, cypher: &str) -> Result<i64> {
    let rows = client.query(query(cypher)).await?;
    Ok(rows
        .into_iter()
        .next()
        .and_then(|row| row.get("count").ok())
        .unwrap_or(0))
}
