//! Full-table extraction of the six relational entities.
//!
//! Every run reads every row, ordered by primary key. There is no
//! filtering, pagination, or incremental watermarking at this data scale.

use chrono::{DateTime, NaiveDate, Utc};
use tokio_postgres::Client;
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i32,
}

/// Interaction event kind, as stored in the relational `event_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Viewed,
    Clicked,
    AddedToCart,
    /// Anything the source emits that we do not recognize. Loaded as a
    /// generic interaction; never counted by the trending query.
    Other,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Viewed,
        EventKind::Clicked,
        EventKind::AddedToCart,
        EventKind::Other,
    ];

    pub fn from_db(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "view" => EventKind::Viewed,
            "click" => EventKind::Clicked,
            "add_to_cart" => EventKind::AddedToCart,
            _ => EventKind::Other,
        }
    }

    /// Graph relationship type this kind maps to.
    pub fn rel_type(&self) -> &'static str {
        match self {
            EventKind::Viewed => "VIEWED",
            EventKind::Clicked => "CLICKED",
            EventKind::AddedToCart => "ADDED_TO_CART",
            EventKind::Other => "INTERACTED_WITH",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub kind: EventKind,
    pub ts: DateTime<Utc>,
}

/// Everything one pipeline run extracted, in load order.
#[derive(Debug, Default)]
pub struct Extraction {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub events: Vec<Event>,
}

/// Per-kind row counts, kept for the post-load verification phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionCounts {
    pub categories: usize,
    pub products: usize,
    pub customers: usize,
    pub orders: usize,
    pub order_items: usize,
    pub events: usize,
}

impl Extraction {
    pub fn counts(&self) -> ExtractionCounts {
        ExtractionCounts {
            categories: self.categories.len(),
            products: self.products.len(),
            customers: self.customers.len(),
            orders: self.orders.len(),
            order_items: self.order_items.len(),
            events: self.events.len(),
        }
    }
}

pub async fn extract_all(pg: &Client) -> Result<Extraction> {
    let categories = extract_categories(pg).await?;
    info!("  ✓ Extracted {} categories", categories.len());

    let products = extract_products(pg).await?;
    info!("  ✓ Extracted {} products", products.len());

    let customers = extract_customers(pg).await?;
    info!("  ✓ Extracted {} customers", customers.len());

    let orders = extract_orders(pg).await?;
    info!("  ✓ Extracted {} orders", orders.len());

    let order_items = extract_order_items(pg).await?;
    info!("  ✓ Extracted {} order items", order_items.len());

    let events = extract_events(pg).await?;
    info!("  ✓ Extracted {} events", events.len());

    Ok(Extraction {
        categories,
        products,
        customers,
        orders,
        order_items,
        events,
    })
}

async fn extract_categories(pg: &Client) -> Result<Vec<Category>> {
    let rows = pg
        .query("SELECT id, name FROM categories ORDER BY id", &[])
        .await?;

    let mut categories = Vec::with_capacity(rows.len());
    for row in rows {
        categories.push(Category {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        });
    }
    Ok(categories)
}

async fn extract_products(pg: &Client) -> Result<Vec<Product>> {
    // NUMERIC is cast to float8 server-side; product prices do not need
    // arbitrary precision in the graph.
    let rows = pg
        .query(
            "SELECT id, name, price::float8 AS price, category_id FROM products ORDER BY id",
            &[],
        )
        .await?;

    let mut products = Vec::with_capacity(rows.len());
    for row in rows {
        products.push(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            category_id: row.try_get("category_id")?,
        });
    }
    Ok(products)
}

async fn extract_customers(pg: &Client) -> Result<Vec<Customer>> {
    let rows = pg
        .query("SELECT id, name, join_date FROM customers ORDER BY id", &[])
        .await?;

    let mut customers = Vec::with_capacity(rows.len());
    for row in rows {
        customers.push(Customer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            join_date: row.try_get("join_date")?,
        });
    }
    Ok(customers)
}

async fn extract_orders(pg: &Client) -> Result<Vec<Order>> {
    let rows = pg
        .query("SELECT id, customer_id, ts FROM orders ORDER BY id", &[])
        .await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        orders.push(Order {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            ts: row.try_get("ts")?,
        });
    }
    Ok(orders)
}

async fn extract_order_items(pg: &Client) -> Result<Vec<OrderItem>> {
    let rows = pg
        .query(
            "SELECT order_id, product_id, quantity FROM order_items ORDER BY order_id, product_id",
            &[],
        )
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(OrderItem {
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
        });
    }
    Ok(items)
}

async fn extract_events(pg: &Client) -> Result<Vec<Event>> {
    let rows = pg
        .query(
            "SELECT id, customer_id, product_id, event_type, ts FROM events ORDER BY id",
            &[],
        )
        .await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        let raw_kind: String = row.try_get("event_type")?;
        events.push(Event {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            product_id: row.try_get("product_id")?,
            kind: EventKind::from_db(&raw_kind),
            ts: row.try_get("ts")?,
        });
    }
    Ok(events)
}
