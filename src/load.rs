//! Neo4j batch loading.
//!
//! Wipe-and-reload of the whole graph using UNWIND batch statements with
//! one write transaction per chunk. Later kinds reference earlier kinds by
//! identifier, so the kind order is fixed: categories, products,
//! customers, orders, order items, events.

use std::collections::HashMap;

use chrono::SecondsFormat;
use neo4rs::{query, BoltType};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::extract::{
    Category, Customer, Event, EventKind, Extraction, Order, OrderItem, Product,
};
use crate::graph::GraphClient;
use crate::queries::stats;

// ============================================================================
// Configuration
// ============================================================================

const DEFAULT_BATCH_SIZE: usize = 500;

pub struct BatchConfig {
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

// ============================================================================
// Row maps
// ============================================================================

type BoltRow = HashMap<String, BoltType>;

fn category_row(c: &Category) -> BoltRow {
    let mut m: BoltRow = HashMap::new();
    m.insert("id".to_string(), c.id.clone().into());
    m.insert("name".to_string(), c.name.clone().into());
    m
}

fn product_row(p: &Product) -> BoltRow {
    let mut m: BoltRow = HashMap::new();
    m.insert("id".to_string(), p.id.clone().into());
    m.insert("name".to_string(), p.name.clone().into());
    m.insert("price".to_string(), p.price.into());
    // Empty string marks "no category"; the load statement filters it out
    // before matching the Category endpoint.
    m.insert(
        "category_id".to_string(),
        p.category_id.clone().unwrap_or_default().into(),
    );
    m
}

fn customer_row(c: &Customer) -> BoltRow {
    let mut m: BoltRow = HashMap::new();
    m.insert("id".to_string(), c.id.clone().into());
    m.insert("name".to_string(), c.name.clone().into());
    m.insert("join_date".to_string(), c.join_date.to_string().into());
    m
}

fn order_row(o: &Order) -> BoltRow {
    let mut m: BoltRow = HashMap::new();
    m.insert("id".to_string(), o.id.clone().into());
    m.insert("customer_id".to_string(), o.customer_id.clone().into());
    m.insert(
        "ts".to_string(),
        o.ts.to_rfc3339_opts(SecondsFormat::Secs, true).into(),
    );
    m
}

fn order_item_row(i: &OrderItem) -> BoltRow {
    let mut m: BoltRow = HashMap::new();
    m.insert("order_id".to_string(), i.order_id.clone().into());
    m.insert("product_id".to_string(), i.product_id.clone().into());
    m.insert("quantity".to_string(), (i.quantity as i64).into());
    m
}

fn event_row(e: &Event) -> BoltRow {
    let mut m: BoltRow = HashMap::new();
    m.insert("event_id".to_string(), e.id.clone().into());
    m.insert("customer_id".to_string(), e.customer_id.clone().into());
    m.insert("product_id".to_string(), e.product_id.clone().into());
    m.insert(
        "ts".to_string(),
        e.ts.to_rfc3339_opts(SecondsFormat::Secs, true).into(),
    );
    m
}

// ============================================================================
// Load statements
// ============================================================================
//
// Nodes merge by identifier; relationships merge on (start, end, type,
// distinguishing property) so duplicate source rows and re-runs cannot
// inflate relationship counts.

const CATEGORY_LOAD: &str = "UNWIND $batch AS row
 MERGE (c:Category {id: row.id})
 SET c.name = row.name";

const PRODUCT_LOAD: &str = "UNWIND $batch AS row
 MERGE (p:Product {id: row.id})
 SET p.name = row.name,
     p.price = row.price
 WITH p, row
 WHERE row.category_id <> ''
 MATCH (c:Category {id: row.category_id})
 MERGE (p)-[:IN_CATEGORY]->(c)";

const CUSTOMER_LOAD: &str = "UNWIND $batch AS row
 MERGE (c:Customer {id: row.id})
 SET c.name = row.name,
     c.join_date = date(row.join_date)";

const ORDER_LOAD: &str = "UNWIND $batch AS row
 MERGE (o:Order {id: row.id})
 SET o.ts = datetime(row.ts)
 WITH o, row
 MATCH (c:Customer {id: row.customer_id})
 MERGE (c)-[:PLACED]->(o)";

const ORDER_ITEM_LOAD: &str = "UNWIND $batch AS row
 MATCH (o:Order {id: row.order_id})
 MATCH (p:Product {id: row.product_id})
 MERGE (o)-[:CONTAINS {quantity: row.quantity}]->(p)";

/// Relationship types cannot be parameterized in Cypher, so each event
/// kind gets its own statement. `rel` is always one of the fixed
/// `EventKind::rel_type` values, never user input.
fn event_load(rel: &str) -> String {
    format!(
        "UNWIND $batch AS row
 MATCH (c:Customer {{id: row.customer_id}})
 MATCH (p:Product {{id: row.product_id}})
 MERGE (c)-[r:{rel} {{event_id: row.event_id}}]->(p)
 SET r.ts = datetime(row.ts)"
    )
}

// ============================================================================
// Pipeline phases
// ============================================================================

/// Wipe phase: remove every node and relationship. Runs to completion
/// before any write so stale uniqueness values cannot collide with the
/// fresh load.
pub async fn wipe_graph(client: &GraphClient) -> Result<()> {
    info!("Clearing existing graph data...");
    client.execute(query("MATCH (n) DETACH DELETE n")).await?;
    Ok(())
}

/// Load phase: wipe, then load each kind in dependency order.
pub async fn load_graph(
    client: &GraphClient,
    data: &Extraction,
    config: Option<BatchConfig>,
) -> Result<()> {
    let config = config.unwrap_or_default();
    info!(
        "Loading graph data (batch_size={})...",
        config.batch_size
    );

    wipe_graph(client).await?;

    let rows: Vec<BoltRow> = data.categories.iter().map(category_row).collect();
    run_chunked(client, "categories", CATEGORY_LOAD, rows, config.batch_size).await?;
    info!("   Loaded {} categories", data.categories.len());

    let rows: Vec<BoltRow> = data.products.iter().map(product_row).collect();
    run_chunked(client, "products", PRODUCT_LOAD, rows, config.batch_size).await?;
    info!("   Loaded {} products", data.products.len());

    let rows: Vec<BoltRow> = data.customers.iter().map(customer_row).collect();
    run_chunked(client, "customers", CUSTOMER_LOAD, rows, config.batch_size).await?;
    info!("   Loaded {} customers", data.customers.len());

    let rows: Vec<BoltRow> = data.orders.iter().map(order_row).collect();
    run_chunked(client, "orders", ORDER_LOAD, rows, config.batch_size).await?;
    info!("   Loaded {} orders", data.orders.len());

    let rows: Vec<BoltRow> = data.order_items.iter().map(order_item_row).collect();
    run_chunked(
        client,
        "order_items",
        ORDER_ITEM_LOAD,
        rows,
        config.batch_size,
    )
    .await?;
    info!("   Loaded {} order items", data.order_items.len());

    load_events(client, &data.events, config.batch_size).await?;
    info!("   Loaded {} events", data.events.len());

    Ok(())
}

/// Apply one statement over fixed-size contiguous chunks, one write
/// transaction per chunk. A failed chunk aborts the load; chunks committed
/// before it stay committed.
async fn run_chunked(
    client: &GraphClient,
    kind: &'static str,
    cypher: &str,
    rows: Vec<BoltRow>,
    batch_size: usize,
) -> Result<()> {
    for (chunk_idx, chunk) in rows.chunks(batch_size).enumerate() {
        let mut txn = client
            .inner()
            .start_txn()
            .await
            .map_err(|e| load_failed(kind, chunk_idx, e))?;

        let q = query(cypher).param("batch", chunk.to_vec());
        if let Err(e) = txn.run(q).await {
            if let Err(rb) = txn.rollback().await {
                warn!("Rollback failed for {} chunk {}: {}", kind, chunk_idx, rb);
            }
            return Err(load_failed(kind, chunk_idx, e));
        }

        txn.commit()
            .await
            .map_err(|e| load_failed(kind, chunk_idx, e))?;
    }
    Ok(())
}

/// Events chunk like every other kind, but rows inside a chunk are grouped
/// by relationship type and written by one statement per type, all within
/// the chunk's single transaction.
async fn load_events(client: &GraphClient, events: &[Event], batch_size: usize) -> Result<()> {
    for (chunk_idx, chunk) in events.chunks(batch_size).enumerate() {
        let grouped = group_events_by_kind(chunk);

        let mut txn = client
            .inner()
            .start_txn()
            .await
            .map_err(|e| load_failed("events", chunk_idx, e))?;

        for (kind, rows) in grouped {
            let q = query(&event_load(kind.rel_type())).param("batch", rows);
            if let Err(e) = txn.run(q).await {
                if let Err(rb) = txn.rollback().await {
                    warn!("Rollback failed for events chunk {}: {}", chunk_idx, rb);
                }
                return Err(load_failed("events", chunk_idx, e));
            }
        }

        txn.commit()
            .await
            .map_err(|e| load_failed("events", chunk_idx, e))?;
    }
    Ok(())
}

fn group_events_by_kind(chunk: &[Event]) -> Vec<(EventKind, Vec<BoltRow>)> {
    EventKind::ALL
        .iter()
        .filter_map(|kind| {
            let rows: Vec<BoltRow> = chunk
                .iter()
                .filter(|e| e.kind == *kind)
                .map(event_row)
                .collect();
            if rows.is_empty() {
                None
            } else {
                Some((*kind, rows))
            }
        })
        .collect()
}

fn load_failed(kind: &'static str, chunk: usize, source: neo4rs::Error) -> Error {
    Error::LoadFailed {
        kind,
        chunk,
        source,
    }
}

/// Verification phase: read back per-label node counts and the total
/// relationship count and compare with what was extracted. Mismatches are
/// reported, not fatal; relationship deduplication legitimately collapses
/// duplicate source rows.
pub async fn verify_counts(client: &GraphClient, data: &Extraction) -> Result<()> {
    info!("Verifying loaded data...");
    let stats = stats::graph_stats(client).await?;
    let expected = data.counts();

    check_count("Category", stats.categories, expected.categories);
    check_count("Product", stats.products, expected.products);
    check_count("Customer", stats.customers, expected.customers);
    check_count("Order", stats.orders, expected.orders);

    let expected_rels = expected_relationships(data) as i64;
    if stats.relationships == expected_rels {
        info!("  Total relationships: {}", stats.relationships);
    } else {
        warn!(
            "  Total relationships: {} (source rows imply {}; merge deduplication collapses full duplicates)",
            stats.relationships, expected_rels
        );
    }
    Ok(())
}

/// Relationship count implied by the source rows, before deduplication.
fn expected_relationships(data: &Extraction) -> usize {
    let categorized = data
        .products
        .iter()
        .filter(|p| p.category_id.is_some())
        .count();
    categorized + data.orders.len() + data.order_items.len() + data.events.len()
}

fn check_count(label: &str, actual: i64, expected: usize) {
    if actual == expected as i64 {
        info!("  {} nodes: {}", label, actual);
    } else {
        warn!(
            "  {} nodes: {} (extracted {})",
            label, actual, expected
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample_event(id: &str, kind: EventKind) -> Event {
        Event {
            id: id.to_string(),
            customer_id: "c1".to_string(),
            product_id: "p1".to_string(),
            kind,
            ts: Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_category_row_keys_match_statement() {
        let row = category_row(&Category {
            id: "cat-1".to_string(),
            name: "Electronics".to_string(),
        });

        assert!(row.contains_key("id"));
        assert!(row.contains_key("name"));
    }

    #[test]
    fn test_product_row_uses_empty_sentinel_for_missing_category() {
        let row = product_row(&Product {
            id: "p1".to_string(),
            name: "Widget".to_string(),
            price: 9.99,
            category_id: None,
        });

        assert!(row.contains_key("price"));
        assert_eq!(
            row.get("category_id"),
            Some(&BoltType::from("".to_string()))
        );
    }

    #[test]
    fn test_customer_row_formats_join_date_as_iso() {
        let row = customer_row(&Customer {
            id: "c1".to_string(),
            name: "Ada".to_string(),
            join_date: NaiveDate::from_ymd_opt(2023, 7, 14).unwrap(),
        });

        assert_eq!(
            row.get("join_date"),
            Some(&BoltType::from("2023-07-14".to_string()))
        );
    }

    #[test]
    fn test_order_row_formats_ts_as_rfc3339_utc() {
        let row = order_row(&Order {
            id: "o1".to_string(),
            customer_id: "c1".to_string(),
            ts: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        });

        assert_eq!(
            row.get("ts"),
            Some(&BoltType::from("2024-01-02T03:04:05Z".to_string()))
        );
        assert!(row.contains_key("customer_id"));
    }

    #[test]
    fn test_order_item_row_carries_quantity() {
        let row = order_item_row(&OrderItem {
            order_id: "o1".to_string(),
            product_id: "p1".to_string(),
            quantity: 3,
        });

        assert_eq!(row.get("quantity"), Some(&BoltType::from(3i64)));
        assert!(row.contains_key("order_id"));
        assert!(row.contains_key("product_id"));
    }

    #[test]
    fn test_event_row_keys_match_statement() {
        let row = event_row(&sample_event("e1", EventKind::Viewed));

        for key in ["event_id", "customer_id", "product_id", "ts"] {
            assert!(row.contains_key(key), "missing key {}", key);
        }
    }

    #[test]
    fn test_event_grouping_splits_by_relationship_type() {
        let chunk = vec![
            sample_event("e1", EventKind::Viewed),
            sample_event("e2", EventKind::Clicked),
            sample_event("e3", EventKind::Viewed),
        ];

        let grouped = group_events_by_kind(&chunk);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, EventKind::Viewed);
        assert_eq!(grouped[0].1.len(), 2);
        assert_eq!(grouped[1].0, EventKind::Clicked);
        assert_eq!(grouped[1].1.len(), 1);
    }

    #[test]
    fn test_event_grouping_empty_chunk() {
        assert!(group_events_by_kind(&[]).is_empty());
    }

    #[test]
    fn test_event_statement_interpolates_relationship_type() {
        let q = event_load(EventKind::AddedToCart.rel_type());
        assert!(q.contains("[r:ADDED_TO_CART {event_id: row.event_id}]"));
        assert!(q.contains("MERGE"));
    }

    #[test]
    fn test_chunk_partitioning_is_contiguous_and_complete() {
        let rows: Vec<u32> = (0..1201).collect();
        let chunks: Vec<&[u32]> = rows.chunks(DEFAULT_BATCH_SIZE).collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 201);
        assert_eq!(chunks[1][0], 500);

        let empty: Vec<u32> = Vec::new();
        assert_eq!(empty.chunks(DEFAULT_BATCH_SIZE).count(), 0);
    }

    #[test]
    fn test_expected_relationships_skips_uncategorized_products() {
        let data = Extraction {
            products: vec![
                Product {
                    id: "p1".to_string(),
                    name: "Widget".to_string(),
                    price: 1.0,
                    category_id: Some("cat-1".to_string()),
                },
                Product {
                    id: "p2".to_string(),
                    name: "Gadget".to_string(),
                    price: 2.0,
                    category_id: None,
                },
            ],
            orders: vec![Order {
                id: "o1".to_string(),
                customer_id: "c1".to_string(),
                ts: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }],
            order_items: vec![OrderItem {
                order_id: "o1".to_string(),
                product_id: "p1".to_string(),
                quantity: 1,
            }],
            events: vec![sample_event("e1", EventKind::Viewed)],
            ..Default::default()
        };

        // IN_CATEGORY (1) + PLACED (1) + CONTAINS (1) + event (1)
        assert_eq!(expected_relationships(&data), 4);
    }

    #[test]
    fn test_relationship_merges_deduplicate_on_distinguishing_property() {
        assert!(ORDER_ITEM_LOAD.contains("MERGE (o)-[:CONTAINS {quantity: row.quantity}]->(p)"));
        let ev = event_load("VIEWED");
        assert!(ev.contains("{event_id: row.event_id}"));
    }

    #[test]
    fn test_node_loads_merge_by_identifier() {
        for statement in [CATEGORY_LOAD, PRODUCT_LOAD, CUSTOMER_LOAD, ORDER_LOAD] {
            assert!(statement.contains("{id: row.id}"), "{}", statement);
            assert!(statement.contains("MERGE"), "{}", statement);
        }
    }
}
