//! Kitchen display endpoints under `/api/kitchen`.
//!
//! | Route | Effect |
//! |-------|--------|
//! | `GET /orders` | cached active orders, never fails |
//! | `POST /orders/{id}/ready` | transition to READY and announce it |
//! | `POST /orders/{id}/preparing` / `confirmed` / `created` | plain transitions |
//! | `POST /orders/{id}/status` | transition to the status in `{"status": ...}` |
//! | `GET /health` | liveness |
//! | `GET /debug/status` | configuration summary and an upstream probe |
//!
//! The `Authorization`, `X-User-Id` and `X-Table-Id` headers of a transition request are
//! forwarded to the upstream as received.

use crate::api::{with_layers, ApiError};
use crate::clients::{TABLE_ID_HEADER, USER_ID_HEADER};
use crate::config::Config;
use crate::kitchen::KitchenService;
use crate::model::{AuthContext, OrderId, OrderSnapshot, OrderStatus};
use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct KitchenState {
    pub service: KitchenService,
    pub config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub fn router(state: KitchenState) -> Router {
    let routes = Router::new()
        .route("/orders", get(active_orders))
        .route("/orders/{id}/ready", post(mark_ready))
        .route("/orders/{id}/preparing", post(mark_preparing))
        .route("/orders/{id}/confirmed", post(mark_confirmed))
        .route("/orders/{id}/created", post(mark_created))
        .route("/orders/{id}/status", post(update_status))
        .route("/health", get(health))
        .route("/debug/status", get(debug_status))
        .with_state(state);

    with_layers(Router::new().nest("/api/kitchen", routes))
}

/// Credentials to forward, read verbatim from the request.
pub fn auth_context(headers: &HeaderMap) -> AuthContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    AuthContext::new(
        header(AUTHORIZATION.as_str()),
        header(USER_ID_HEADER),
        header(TABLE_ID_HEADER),
    )
}

async fn active_orders(State(state): State<KitchenState>) -> Json<Vec<OrderSnapshot>> {
    let orders = state.service.active_orders().await;
    info!(count = orders.len(), "Returning active orders");
    Json(orders)
}

async fn transition(
    state: &KitchenState,
    id: u64,
    target: OrderStatus,
    headers: &HeaderMap,
) -> Result<Json<OrderSnapshot>, ApiError> {
    let auth = auth_context(headers);
    info!(order_id = id, %target, user_id = ?auth.user_id, table_id = ?auth.table_id, "Status change requested");
    let snapshot = state.service.transition(OrderId(id), target, &auth).await?;
    Ok(Json(snapshot))
}

async fn mark_ready(
    State(state): State<KitchenState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<OrderSnapshot>, ApiError> {
    transition(&state, id, OrderStatus::Ready, &headers).await
}

async fn mark_preparing(
    State(state): State<KitchenState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<OrderSnapshot>, ApiError> {
    transition(&state, id, OrderStatus::Preparing, &headers).await
}

async fn mark_confirmed(
    State(state): State<KitchenState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<OrderSnapshot>, ApiError> {
    transition(&state, id, OrderStatus::Confirmed, &headers).await
}

async fn mark_created(
    State(state): State<KitchenState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<OrderSnapshot>, ApiError> {
    transition(&state, id, OrderStatus::Created, &headers).await
}

async fn update_status(
    State(state): State<KitchenState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(request): Json<StatusRequest>,
) -> Result<Json<OrderSnapshot>, ApiError> {
    let target = request
        .status
        .parse::<OrderStatus>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    transition(&state, id, target, &headers).await
}

async fn health() -> &'static str {
    "KDS Service is running"
}

async fn debug_status(State(state): State<KitchenState>) -> Json<Value> {
    let cached = state.service.active_orders().await.len();
    let upstream = match state.service.probe_upstream().await {
        Ok(count) => json!({ "status": "OK", "activeOrders": count }),
        Err(e) => json!({ "status": format!("ERROR: {}", e) }),
    };

    Json(json!({
        "orderServiceBaseUrl": state.config.order_service_base_url,
        "natsUrl": state.config.nats_url,
        "orderReadySubject": state.config.order_ready_subject,
        "pollIntervalMs": state.config.poll_interval.as_millis() as u64,
        "cacheTiers": state.service.cache_tiers(),
        "cachedOrdersCount": cached,
        "orderService": upstream,
    }))
}
