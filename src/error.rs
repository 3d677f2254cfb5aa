//! Error taxonomy shared by the ETL pipeline and the API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A backing store never became reachable within the attempt budget.
    /// Fatal: the run (or the API process start) aborts.
    #[error("{store} unreachable after {attempts} connection attempts")]
    ConnectionUnavailable { store: &'static str, attempts: u32 },

    /// A batch write transaction failed during the load phase. Chunks
    /// committed before this one stay committed; the run aborts.
    #[error("load failed for kind '{kind}' at chunk {chunk}")]
    LoadFailed {
        kind: &'static str,
        chunk: usize,
        #[source]
        source: neo4rs::Error,
    },

    /// A read statement against the graph store failed. The API maps this
    /// to a 500 response; there is no retry.
    #[error("graph query failed")]
    QueryFailed(#[from] neo4rs::Error),

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
