//! Bounded-attempt connection establishment.
//!
//! Both stores are polled at pipeline start with a fixed inter-attempt
//! delay and a hard attempt ceiling. The attempt budget is modeled as an
//! explicit state machine so the bounded-attempt contract can be tested
//! without touching a real network.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{Neo4jConfig, PostgresConfig};
use crate::error::{Error, Result};
use crate::graph::GraphClient;

/// Where a connection attempt sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectState {
    /// Attempt `attempt` (1-based) is the next one to run.
    Connecting { attempt: u32 },
    Connected,
    /// The attempt budget is exhausted.
    Failed,
}

/// Fixed-delay retry budget. No backoff, no jitter: this is a pre-flight
/// liveness check, not a resilience mechanism.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn initial(&self) -> ConnectState {
        ConnectState::Connecting { attempt: 1 }
    }

    /// Pure transition function. Terminal states stay put.
    pub fn advance(&self, state: ConnectState, succeeded: bool) -> ConnectState {
        match state {
            ConnectState::Connecting { .. } if succeeded => ConnectState::Connected,
            ConnectState::Connecting { attempt } if attempt >= self.max_attempts => {
                ConnectState::Failed
            }
            ConnectState::Connecting { attempt } => ConnectState::Connecting {
                attempt: attempt + 1,
            },
            terminal => terminal,
        }
    }
}

/// Drive the state machine against an async attempt operation, sleeping
/// the policy delay between failed attempts.
pub async fn connect_with_retry<T, E, F, Fut>(
    store: &'static str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: fmt::Display,
{
    let mut state = policy.initial();

    while let ConnectState::Connecting { attempt } = state {
        info!(
            "Connecting to {}... (attempt {}/{})",
            store, attempt, policy.max_attempts
        );

        match op().await {
            Ok(handle) => {
                info!("✅ Connected to {}", store);
                return Ok(handle);
            }
            Err(e) => {
                state = policy.advance(state, false);
                if let ConnectState::Connecting { .. } = state {
                    warn!(
                        "{} not ready: {}. Retrying in {}s...",
                        store,
                        e,
                        policy.delay.as_secs()
                    );
                    sleep(policy.delay).await;
                }
            }
        }
    }

    Err(Error::ConnectionUnavailable {
        store,
        attempts: policy.max_attempts,
    })
}

/// Poll PostgreSQL until it accepts connections, then hand back a working
/// client. The connection task is spawned onto the runtime.
pub async fn wait_for_postgres(
    config: &PostgresConfig,
    policy: &RetryPolicy,
) -> Result<tokio_postgres::Client> {
    let conn_string = config.conn_string();

    connect_with_retry("PostgreSQL", policy, || {
        let conn_string = conn_string.clone();
        async move {
            let (client, connection) =
                tokio_postgres::connect(&conn_string, tokio_postgres::NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    warn!("PostgreSQL connection task ended: {}", e);
                }
            });
            Ok::<_, tokio_postgres::Error>(client)
        }
    })
    .await
}

/// Poll Neo4j until it answers a ping, then hand back the client.
pub async fn wait_for_neo4j(config: &Neo4jConfig, policy: &RetryPolicy) -> Result<GraphClient> {
    connect_with_retry("Neo4j", policy, || GraphClient::connect(config)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_transition_success_terminates() {
        let p = policy(4);
        let state = p.advance(p.initial(), true);
        assert_eq!(state, ConnectState::Connected);
        // Terminal states are absorbing.
        assert_eq!(p.advance(state, false), ConnectState::Connected);
    }

    #[test]
    fn test_transition_counts_attempts_exactly() {
        let p = policy(3);
        let mut state = p.initial();

        state = p.advance(state, false);
        assert_eq!(state, ConnectState::Connecting { attempt: 2 });
        state = p.advance(state, false);
        assert_eq!(state, ConnectState::Connecting { attempt: 3 });
        state = p.advance(state, false);
        assert_eq!(state, ConnectState::Failed);
        assert_eq!(p.advance(state, true), ConnectState::Failed);
    }

    #[test]
    fn test_transition_success_on_last_attempt() {
        let p = policy(2);
        let mut state = p.initial();
        state = p.advance(state, false);
        assert_eq!(state, ConnectState::Connecting { attempt: 2 });
        assert_eq!(p.advance(state, true), ConnectState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = connect_with_retry("test-store", &policy(5), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("not ready")
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_attempt_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32> = connect_with_retry("test-store", &policy(4), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>("still down")
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(Error::ConnectionUnavailable { store, attempts }) => {
                assert_eq!(store, "test-store");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected ConnectionUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_first_attempt_success_sleeps_never() {
        let start = tokio::time::Instant::now();
        let result = connect_with_retry("test-store", &policy(4), || async { Ok::<_, &str>(()) })
            .await;

        assert!(result.is_ok());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
