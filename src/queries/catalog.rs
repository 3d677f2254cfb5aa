//! Catalog listings: all customers, all products.

use neo4rs::{query, Row};
use serde::Serialize;

use crate::error::Result;
use crate::graph::GraphClient;

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub name: String,
    pub join_date: String,
    pub order_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub order_count: i64,
}

const LIST_CUSTOMERS: &str = "MATCH (c:Customer)
 OPTIONAL MATCH (c)-[:PLACED]->(o:Order)
 WITH c, count(DISTINCT o) AS order_count
 RETURN c.id AS customer_id, c.name AS name,
        toString(c.join_date) AS join_date, order_count
 ORDER BY name ASC, customer_id ASC";

const LIST_PRODUCTS: &str = "MATCH (p:Product)
 OPTIONAL MATCH (p)-[:IN_CATEGORY]->(cat:Category)
 OPTIONAL MATCH (p)<-[:CONTAINS]-(o:Order)
 WITH p, cat, count(DISTINCT o) AS order_count
 RETURN p.id AS product_id, p.name AS name, p.price AS price,
        cat.name AS category, order_count
 ORDER BY name ASC, product_id ASC";

pub async fn list_customers(client: &GraphClient) -> Result<Vec<CustomerRecord>> {
    let rows = client.query(query(LIST_CUSTOMERS)).await?;
    Ok(rows.into_iter().filter_map(parse_customer_row).collect())
}

pub async fn list_products(client: &GraphClient) -> Result<Vec<ProductRecord>> {
    let rows = client.query(query(LIST_PRODUCTS)).await?;
    Ok(rows.into_iter().filter_map(parse_product_row).collect())
}

fn parse_customer_row(row: Row) -> Option<CustomerRecord> {
    let customer_id: String = row.get("customer_id").unwrap_or_default();
    if customer_id.is_empty() {
        return None;
    }
    Some(CustomerRecord {
        customer_id,
        name: row.get("name").unwrap_or_default(),
        join_date: row.get("join_date").unwrap_or_default(),
        order_count: row.get("order_count").unwrap_or_default(),
    })
}

fn parse_product_row(row: Row) -> Option<ProductRecord> {
    let product_id: String = row.get("product_id").unwrap_or_default();
    if product_id.is_empty() {
        return None;
    }
    Some(ProductRecord {
        product_id,
        name: row.get("name").unwrap_or_default(),
        price: row.get("price").unwrap_or_default(),
        category: row.get("category").ok(),
        order_count: row.get("order_count").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listings_are_ordered_by_name() {
        assert!(LIST_CUSTOMERS.contains("ORDER BY name ASC, customer_id ASC"));
        assert!(LIST_PRODUCTS.contains("ORDER BY name ASC, product_id ASC"));
    }

    #[test]
    fn test_product_listing_keeps_uncategorized_products() {
        assert!(LIST_PRODUCTS.contains("OPTIONAL MATCH (p)-[:IN_CATEGORY]->(cat:Category)"));
    }
}
