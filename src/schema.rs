//! Neo4j schema bootstrap (constraints and indexes).

use neo4rs::query;
use tracing::info;

use crate::error::Result;
use crate::graph::GraphClient;

/// Schema statements issued before every load. Order does not matter;
/// each statement is independent.
const SCHEMA_STATEMENTS: &[&str] = &[
    // Uniqueness constraints on node identifiers
    "CREATE CONSTRAINT customer_id IF NOT EXISTS FOR (c:Customer) REQUIRE c.id IS UNIQUE",
    "CREATE CONSTRAINT product_id IF NOT EXISTS FOR (p:Product) REQUIRE p.id IS UNIQUE",
    "CREATE CONSTRAINT category_id IF NOT EXISTS FOR (c:Category) REQUIRE c.id IS UNIQUE",
    "CREATE CONSTRAINT order_id IF NOT EXISTS FOR (o:Order) REQUIRE o.id IS UNIQUE",
    // Lookup indexes
    "CREATE INDEX product_name IF NOT EXISTS FOR (p:Product) ON (p.name)",
    "CREATE INDEX category_name IF NOT EXISTS FOR (c:Category) ON (c.name)",
    "CREATE INDEX customer_name IF NOT EXISTS FOR (c:Customer) ON (c.name)",
];

/// Initialize constraints and indexes.
///
/// Safe to run on every pipeline start thanks to the IF NOT EXISTS
/// clauses. Any single failure is fatal: it means the target store is not
/// a usable graph database.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    info!("Setting up Neo4j schema (constraints & indexes)...");

    for statement in SCHEMA_STATEMENTS {
        client.execute(query(statement)).await?;
    }

    info!(
        "Schema initialized ({} statements)",
        SCHEMA_STATEMENTS.len()
    );
    Ok(())
}
