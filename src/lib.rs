//! PostgreSQL → Neo4j ETL pipeline and graph-based recommendation API
//! for a small e-commerce dataset.
//!
//! The ETL binary performs a full wipe-and-reload of the product graph;
//! the API binary serves read-only recommendation queries over it.

pub mod config;
pub mod connect;
pub mod error;
pub mod extract;
pub mod graph;
pub mod load;
pub mod queries;
pub mod routes;
pub mod schema;
pub mod server;

pub use error::{Error, Result};
