//! The four recommendation queries.
//!
//! All rankings order by score descending with an ascending product-id
//! tie-break, so a fixed graph state always yields the same ordering.

use neo4rs::{query, Row};
use serde::Serialize;

use crate::error::Result;
use crate::graph::GraphClient;

/// One ranked recommendation. `score` means "distinct peers" for
/// collaborative, "distinct co-occurring orders" for similar, "distinct
/// containing orders" for category, and "interaction events" for trending.
#[derive(Debug, Clone, Serialize)]
pub struct RankedProduct {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    pub category: Option<String>,
    pub score: i64,
}

const COLLABORATIVE: &str = "MATCH (target:Customer {id: $customer_id})-[:PLACED]->(:Order)-[:CONTAINS]->(p:Product)
 WITH target, collect(DISTINCT p) AS targetProducts
 MATCH (peer:Customer)-[:PLACED]->(:Order)-[:CONTAINS]->(shared:Product)
 WHERE peer <> target AND shared IN targetProducts
 WITH targetProducts, collect(DISTINCT peer) AS peers
 UNWIND peers AS peer
 MATCH (peer)-[:PLACED]->(:Order)-[:CONTAINS]->(rec:Product)
 WHERE NOT rec IN targetProducts
 WITH rec, count(DISTINCT peer) AS score
 ORDER BY score DESC, rec.id ASC
 LIMIT $limit
 OPTIONAL MATCH (rec)-[:IN_CATEGORY]->(cat:Category)
 RETURN rec.id AS product_id, rec.name AS product_name, rec.price AS price,
        cat.name AS category, score
 ORDER BY score DESC, product_id ASC";

const SIMILAR: &str = "MATCH (p:Product {id: $product_id})<-[:CONTAINS]-(o:Order)-[:CONTAINS]->(rec:Product)
 WHERE rec <> p
 WITH rec, count(DISTINCT o) AS score
 ORDER BY score DESC, rec.id ASC
 LIMIT $limit
 OPTIONAL MATCH (rec)-[:IN_CATEGORY]->(cat:Category)
 RETURN rec.id AS product_id, rec.name AS product_name, rec.price AS price,
        cat.name AS category, score
 ORDER BY score DESC, product_id ASC";

const BY_CATEGORY: &str = "MATCH (cat:Category {id: $category_id})<-[:IN_CATEGORY]-(p:Product)
 OPTIONAL MATCH (p)<-[:CONTAINS]-(o:Order)
 WITH p, cat, count(DISTINCT o) AS score
 RETURN p.id AS product_id, p.name AS product_name, p.price AS price,
        cat.name AS category, score
 ORDER BY score DESC, product_id ASC
 LIMIT $limit";

const TRENDING: &str = "MATCH (c:Customer)-[r]->(p:Product)
 WHERE type(r) IN ['VIEWED', 'CLICKED', 'ADDED_TO_CART']
 WITH p, count(r) AS score
 ORDER BY score DESC, p.id ASC
 LIMIT $limit
 OPTIONAL MATCH (p)-[:IN_CATEGORY]->(cat:Category)
 RETURN p.id AS product_id, p.name AS product_name, p.price AS price,
        cat.name AS category, score
 ORDER BY score DESC, product_id ASC";

/// Products bought by customers who share at least one purchased product
/// with the target, excluding what the target already bought, ranked by
/// how many distinct peers bought each candidate.
pub async fn collaborative(
    client: &GraphClient,
    customer_id: &str,
    limit: i64,
) -> Result<Vec<RankedProduct>> {
    let q = query(COLLABORATIVE)
        .param("customer_id", customer_id)
        .param("limit", limit);
    Ok(parse_ranked_rows(client.query(q).await?))
}

/// Products co-occurring with the target in at least one order, ranked by
/// the number of distinct co-occurring orders.
pub async fn similar(
    client: &GraphClient,
    product_id: &str,
    limit: i64,
) -> Result<Vec<RankedProduct>> {
    let q = query(SIMILAR)
        .param("product_id", product_id)
        .param("limit", limit);
    Ok(parse_ranked_rows(client.query(q).await?))
}

/// Products in a category, ranked by how many distinct orders contain each.
pub async fn by_category(
    client: &GraphClient,
    category_id: &str,
    limit: i64,
) -> Result<Vec<RankedProduct>> {
    let q = query(BY_CATEGORY)
        .param("category_id", category_id)
        .param("limit", limit);
    Ok(parse_ranked_rows(client.query(q).await?))
}

/// Products ranked by interaction events (views, clicks, add-to-cart)
/// across all customers.
pub async fn trending(client: &GraphClient, limit: i64) -> Result<Vec<RankedProduct>> {
    let q = query(TRENDING).param("limit", limit);
    Ok(parse_ranked_rows(client.query(q).await?))
}

fn parse_ranked_rows(rows: Vec<Row>) -> Vec<RankedProduct> {
    rows.into_iter()
        .filter_map(|row| {
            let product_id: String = row.get("product_id").unwrap_or_default();
            if product_id.is_empty() {
                return None;
            }
            Some(RankedProduct {
                product_id,
                product_name: row.get("product_name").unwrap_or_default(),
                price: row.get("price").unwrap_or_default(),
                category: row.get("category").ok(),
                score: row.get("score").unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RANKED: [&str; 4] = [COLLABORATIVE, SIMILAR, BY_CATEGORY, TRENDING];

    #[test]
    fn test_rankings_are_deterministic() {
        // Every ranked query must break score ties on ascending product id.
        for cypher in ALL_RANKED {
            assert!(
                cypher.contains("ORDER BY score DESC, product_id ASC"),
                "missing deterministic ordering: {}",
                cypher
            );
            assert!(cypher.contains("LIMIT $limit"), "{}", cypher);
        }
    }

    #[test]
    fn test_collaborative_excludes_owned_products() {
        assert!(COLLABORATIVE.contains("WHERE NOT rec IN targetProducts"));
        assert!(COLLABORATIVE.contains("count(DISTINCT peer) AS score"));
    }

    #[test]
    fn test_similar_counts_distinct_orders() {
        assert!(SIMILAR.contains("count(DISTINCT o) AS score"));
        assert!(SIMILAR.contains("WHERE rec <> p"));
    }

    #[test]
    fn test_trending_counts_only_interaction_events() {
        assert!(TRENDING.contains("type(r) IN ['VIEWED', 'CLICKED', 'ADDED_TO_CART']"));
        assert!(
            !TRENDING.contains("INTERACTED_WITH"),
            "unrecognized event kinds must not count toward trending"
        );
    }

    #[test]
    fn test_category_joins_are_optional() {
        // Uncategorized products must stay in similarity and trending
        // rankings; a plain MATCH on the category would drop them.
        for cypher in [COLLABORATIVE, SIMILAR, TRENDING] {
            assert!(
                cypher.contains("OPTIONAL MATCH (rec)-[:IN_CATEGORY]->(cat:Category)")
                    || cypher.contains("OPTIONAL MATCH (p)-[:IN_CATEGORY]->(cat:Category)"),
                "{}",
                cypher
            );
        }
    }
}
