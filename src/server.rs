//! Axum HTTP server for the recommendation API.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::graph::GraphClient;
use crate::routes;

/// State shared across handlers. The graph client is the only shared
/// resource and is read-only from this layer.
#[derive(Clone)]
pub struct AppState {
    pub graph: GraphClient,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/stats", get(routes::graph_stats))
        .route("/customers", get(routes::list_customers))
        .route("/products", get(routes::list_products))
        .route("/recs/collaborative/{customer_id}", get(routes::collaborative))
        .route("/recs/similar/{product_id}", get(routes::similar))
        .route("/recs/category/{category_id}", get(routes::by_category))
        .route("/recs/trending", get(routes::trending))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(graph: GraphClient, addr: &str) -> anyhow::Result<()> {
    let app = create_router(AppState { graph });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
