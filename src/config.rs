//! Environment-driven configuration for both stores and the HTTP server.

use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl PostgresConfig {
    /// Connection string in the key-value format tokio-postgres parses.
    pub fn conn_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub postgres: PostgresConfig,
    pub neo4j: Neo4jConfig,
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let postgres = PostgresConfig {
            host: env::var("POSTGRES_HOST").unwrap_or_else(|_| "postgres".to_string()),
            port: env::var("POSTGRES_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()?,
            user: env::var("POSTGRES_USER").unwrap_or_else(|_| "app".to_string()),
            password: env::var("POSTGRES_PASSWORD").unwrap_or_else(|_| "password".to_string()),
            dbname: env::var("POSTGRES_DB").unwrap_or_else(|_| "shop".to_string()),
        };

        let neo4j = Neo4jConfig {
            uri: env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://neo4j:7687".to_string()),
            user: env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "password".to_string()),
        };

        Ok(Config {
            postgres,
            neo4j,
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}
