//! Recommendation API routes.
//!
//! Endpoints:
//! - `GET  /api/recommendations/for-you`                      — guest-safe homepage mix
//! - `GET  /api/recommendations/trending`                     — recency-weighted activity
//! - `GET  /api/recommendations/personalized`                 — history-based (needs `x-user-id`)
//! - `GET  /api/recommendations/similar/{product_id}`         — content-based similarity
//! - `GET  /api/recommendations/frequently-bought/{product_id}` — order co-occurrence
//! - `POST /api/recommendations/track`                        — record an interaction (needs `x-user-id`)
//!
//! Every GET accepts `?limit=`; values are capped at [`MAX_RESULT_LIMIT`].
//! Identity comes from the `x-user-id` header, issued by the storefront's
//! auth layer in front of this service.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use storefront_core::domain::activity::ActivityType;
use storefront_core::domain::product::{Product, ProductId};
use storefront_core::domain::user::UserId;
use storefront_core::errors::RecommendationError;
use storefront_core::recs::{
    RecommendationSet, Recommender, DEFAULT_BOUGHT_TOGETHER_LIMIT, DEFAULT_FEED_LIMIT,
    DEFAULT_SIMILAR_LIMIT,
};
use storefront_db::{DbPool, SqlActivityLog, SqlOrderLookup, SqlProductCatalog};

/// Upper bound on `?limit=`; keeps one request from walking the whole catalog.
pub const MAX_RESULT_LIMIT: usize = 50;

#[derive(Clone)]
pub struct RecommendationState {
    engine: Arc<Recommender>,
}

pub fn router(db_pool: DbPool) -> Router {
    let engine = Arc::new(Recommender::new(
        Arc::new(SqlProductCatalog::new(db_pool.clone())),
        Arc::new(SqlOrderLookup::new(db_pool.clone())),
        Arc::new(SqlActivityLog::new(db_pool)),
    ));

    Router::new()
        .route("/api/recommendations/for-you", get(for_you))
        .route("/api/recommendations/trending", get(trending))
        .route("/api/recommendations/personalized", get(personalized))
        .route("/api/recommendations/similar/{product_id}", get(similar))
        .route("/api/recommendations/frequently-bought/{product_id}", get(frequently_bought))
        .route("/api/recommendations/track", post(track))
        .with_state(RecommendationState { engine })
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image: String,
    pub rating: f64,
    pub num_reviews: u32,
    pub stock: u32,
    pub created_at: String,
}

impl From<Product> for ProductPayload {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.0,
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            image: product.image,
            rating: product.rating,
            num_reviews: product.num_reviews,
            stock: product.stock,
            created_at: product.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub products: Vec<ProductPayload>,
    #[serde(rename = "basedOn", skip_serializing_if = "Vec::is_empty")]
    pub based_on: Vec<String>,
}

impl From<RecommendationSet> for RecommendationResponse {
    fn from(set: RecommendationSet) -> Self {
        Self {
            kind: set.kind.as_str(),
            products: set.products.into_iter().map(ProductPayload::from).collect(),
            based_on: set.based_on,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub product_id: String,
    pub activity_type: String,
}

#[derive(Debug, Serialize)]
pub struct TrackAck {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "missing x-user-id header".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { message: self.message })).into_response()
    }
}

impl From<RecommendationError> for ApiError {
    fn from(error: RecommendationError) -> Self {
        match error {
            RecommendationError::ProductNotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: "Product not found".to_string(),
            },
            RecommendationError::Domain(domain) => {
                Self { status: StatusCode::BAD_REQUEST, message: domain.to_string() }
            }
            RecommendationError::Store(store) => {
                warn!(
                    event_name = "api.recommendations.store_error",
                    error = %store,
                    "data store failure while computing recommendations"
                );
                Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "recommendations temporarily unavailable".to_string(),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn for_you(
    State(state): State<RecommendationState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let set = state.engine.for_you(effective_limit(&query, DEFAULT_FEED_LIMIT)).await?;
    Ok(Json(set.into()))
}

pub async fn trending(
    State(state): State<RecommendationState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let set = state.engine.trending(effective_limit(&query, DEFAULT_FEED_LIMIT)).await?;
    Ok(Json(set.into()))
}

pub async fn personalized(
    State(state): State<RecommendationState>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    let set = state
        .engine
        .personalized(&user_id, effective_limit(&query, DEFAULT_FEED_LIMIT))
        .await?;
    Ok(Json(set.into()))
}

pub async fn similar(
    State(state): State<RecommendationState>,
    Path(product_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let set = state
        .engine
        .similar(&ProductId(product_id), effective_limit(&query, DEFAULT_SIMILAR_LIMIT))
        .await?;
    Ok(Json(set.into()))
}

pub async fn frequently_bought(
    State(state): State<RecommendationState>,
    Path(product_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let set = state
        .engine
        .frequently_bought(
            &ProductId(product_id),
            effective_limit(&query, DEFAULT_BOUGHT_TOGETHER_LIMIT),
        )
        .await?;
    Ok(Json(set.into()))
}

pub async fn track(
    State(state): State<RecommendationState>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackAck>, ApiError> {
    let user_id = require_user(&headers)?;
    let activity_type = request.activity_type.parse::<ActivityType>().map_err(|error| {
        ApiError { status: StatusCode::BAD_REQUEST, message: error.to_string() }
    })?;

    state.engine.track(user_id, &ProductId(request.product_id), activity_type).await?;

    Ok(Json(TrackAck { message: "Activity tracked" }))
}

fn effective_limit(query: &LimitQuery, default: usize) -> usize {
    query.limit.unwrap_or(default).min(MAX_RESULT_LIMIT)
}

fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
        .ok_or_else(ApiError::unauthorized)
}
