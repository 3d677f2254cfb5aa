//! Neo4j connection client.

use neo4rs::{query, Graph, Query, Row};

use crate::config::Neo4jConfig;
use crate::error::{Error, Result};

/// Thin wrapper over the neo4rs connection pool.
///
/// The pool is lazy: creating it does not establish a bolt connection.
/// `connect` runs a cheap `RETURN 1` ping so callers get a fast failure
/// when Neo4j is unreachable instead of hanging on the first real query.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let graph = Graph::new(&config.uri, &config.user, &config.password)
            .await
            .map_err(Error::QueryFailed)?;

        graph
            .run(query("RETURN 1"))
            .await
            .map_err(Error::QueryFailed)?;

        Ok(Self { graph })
    }

    /// Execute a Cypher statement that returns no rows.
    pub async fn execute(&self, q: Query) -> Result<()> {
        self.graph.run(q).await.map_err(Error::QueryFailed)
    }

    /// Execute a Cypher statement and collect all result rows.
    pub async fn query(&self, q: Query) -> Result<Vec<Row>> {
        let mut stream = self.graph.execute(q).await.map_err(Error::QueryFailed)?;

        let mut rows = Vec::new();
        while let Ok(Some(row)) = stream.next().await {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Liveness probe used by the health endpoint.
    pub async fn ping(&self) -> bool {
        self.graph.run(query("RETURN 1")).await.is_ok()
    }

    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
