//! HTTP route handlers.
//!
//! Thin dispatch: validate the path parameter, call exactly one query-layer
//! operation, serialize the result. Store failures map to 500; the layer
//! never retries.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Error;
use crate::queries::{catalog, recommend, stats};
use crate::server::AppState;

const DEFAULT_LIMIT: i64 = 5;
const MAX_LIMIT: i64 = 20;

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub strategy: &'static str,
    pub recommendations: Vec<recommend::RankedProduct>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct NodeCounts {
    pub customers: i64,
    pub products: i64,
    pub orders: i64,
    pub categories: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct RelationshipCounts {
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub nodes: NodeCounts,
    pub relationships: RelationshipCounts,
}

#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub customers: Vec<catalog::CustomerRecord>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<catalog::ProductRecord>,
}

fn internal_error(e: Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

/// Path ids only need to be syntactically well-formed: non-blank. An id
/// that matches nothing returns an empty list downstream, not an error.
fn require_id(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "identifier must not be blank".to_string(),
            }),
        ))
    } else {
        Ok(())
    }
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "E-Commerce Recommendation API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "graph_stats": "/stats",
            "customers": "/customers",
            "products": "/products",
            "recommendations_collaborative": "/recs/collaborative/{customer_id}",
            "recommendations_similar": "/recs/similar/{product_id}",
            "recommendations_category": "/recs/category/{category_id}",
            "recommendations_trending": "/recs/trending",
        }
    }))
}

/// Reachability of the graph store only. Always 200; the flag carries the
/// answer.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: state.graph.ping().await,
    })
}

pub async fn graph_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let s = stats::graph_stats(&state.graph)
        .await
        .map_err(internal_error)?;

    Ok(Json(StatsResponse {
        nodes: NodeCounts {
            customers: s.customers,
            products: s.products,
            orders: s.orders,
            categories: s.categories,
            total: s.nodes_total,
        },
        relationships: RelationshipCounts {
            total: s.relationships,
        },
    }))
}

pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<CustomersResponse>, ApiError> {
    let customers = catalog::list_customers(&state.graph)
        .await
        .map_err(internal_error)?;
    Ok(Json(CustomersResponse { customers }))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let products = catalog::list_products(&state.graph)
        .await
        .map_err(internal_error)?;
    Ok(Json(ProductsResponse { products }))
}

pub async fn collaborative(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    require_id(&customer_id)?;
    let recommendations =
        recommend::collaborative(&state.graph, &customer_id, clamp_limit(params.limit))
            .await
            .map_err(internal_error)?;

    Ok(Json(RecommendationResponse {
        customer_id: Some(customer_id),
        product_id: None,
        category_id: None,
        strategy: "collaborative_filtering",
        recommendations,
    }))
}

pub async fn similar(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    require_id(&product_id)?;
    let recommendations = recommend::similar(&state.graph, &product_id, clamp_limit(params.limit))
        .await
        .map_err(internal_error)?;

    Ok(Json(RecommendationResponse {
        customer_id: None,
        product_id: Some(product_id),
        category_id: None,
        strategy: "product_similarity",
        recommendations,
    }))
}

pub async fn by_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    require_id(&category_id)?;
    let recommendations =
        recommend::by_category(&state.graph, &category_id, clamp_limit(params.limit))
            .await
            .map_err(internal_error)?;

    Ok(Json(RecommendationResponse {
        customer_id: None,
        product_id: None,
        category_id: Some(category_id),
        strategy: "category_popularity",
        recommendations,
    }))
}

pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let recommendations = recommend::trending(&state.graph, clamp_limit(params.limit))
        .await
        .map_err(internal_error)?;

    Ok(Json(RecommendationResponse {
        customer_id: None,
        product_id: None,
        category_id: None,
        strategy: "trending",
        recommendations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id_rejects_blank() {
        assert!(require_id("").is_err());
        assert!(require_id("   ").is_err());
        assert!(require_id("\t").is_err());
    }

    #[test]
    fn test_require_id_accepts_normal_ids() {
        assert!(require_id("cust-42").is_ok());
        assert!(require_id("P1").is_ok());
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None), 5);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(500)), 20);
    }

    #[test]
    fn test_recommendation_response_skips_absent_ids() {
        let response = RecommendationResponse {
            customer_id: None,
            product_id: Some("p1".to_string()),
            category_id: None,
            strategy: "product_similarity",
            recommendations: Vec::new(),
        };

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["product_id"], "p1");
        assert_eq!(body["strategy"], "product_similarity");
        assert!(body.get("customer_id").is_none());
        assert!(body.get("category_id").is_none());
    }
}
