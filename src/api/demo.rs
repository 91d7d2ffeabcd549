//! Stand-in order service for local runs.
//!
//! Point `ORDER_SERVICE_BASE_URL` at `http://localhost:<port>/api/waiter` and the kitchen
//! polls two sample orders and gets every status update echoed back.

use crate::model::{RawOrderItem, RawOrderRecord};
use axum::extract::Path;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct DemoStatusBody {
    #[serde(default)]
    pub status: Option<String>,
}

pub fn routes() -> Router {
    Router::new()
        .route("/orders/active", get(active_orders))
        .route(
            "/orders/{id}/status",
            patch(update_status).put(update_status).post(update_status),
        )
}

fn item(id: u64, name: &str, quantity: i64) -> RawOrderItem {
    RawOrderItem {
        id: Some(id),
        item_name: name.to_string(),
        quantity,
    }
}

fn timestamp(minutes_ago: i64) -> Option<String> {
    let at = Utc::now().naive_utc() - Duration::minutes(minutes_ago);
    Some(at.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
}

async fn active_orders() -> Json<Vec<RawOrderRecord>> {
    Json(vec![
        RawOrderRecord {
            id: 1,
            table_id: 101,
            status: "CREATED".to_string(),
            items: vec![item(1, "BBQ Chicken Wings", 2), item(2, "French Fries", 1)],
            created_at: timestamp(0),
        },
        RawOrderRecord {
            id: 2,
            table_id: 102,
            status: "PREPARING".to_string(),
            items: vec![item(3, "Burgers", 1)],
            created_at: timestamp(5),
        },
    ])
}

async fn update_status(Path(id): Path<u64>, Json(body): Json<DemoStatusBody>) -> Json<RawOrderRecord> {
    Json(RawOrderRecord {
        id,
        table_id: 100 + id,
        status: body.status.unwrap_or_else(|| "READY".to_string()),
        items: vec![item(id, &format!("Mock Item {}", id), 1)],
        created_at: timestamp(0),
    })
}
