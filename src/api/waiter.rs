//! Waiter endpoints under `/api/waiter`.
//!
//! `GET /stream` is the live-broadcast channel for browsers: every notification the
//! receiver fans out is pushed as an `order-ready` server-sent event.

use crate::api::{demo, with_layers};
use crate::model::NotificationEvent;
use crate::waiter::WaiterService;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

pub fn router(service: WaiterService) -> Router {
    let routes = Router::new()
        .route("/received-orders", get(received_orders))
        .route("/stream", get(stream_orders))
        .route("/debug/broker", get(debug_broker))
        .route("/health", get(health))
        .with_state(service)
        .merge(demo::routes());

    with_layers(Router::new().nest("/api/waiter", routes))
}

async fn received_orders(State(service): State<WaiterService>) -> Json<Vec<NotificationEvent>> {
    Json(service.received_orders())
}

async fn stream_orders(
    State(service): State<WaiterService>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let connected = stream::once(async {
        Ok::<_, Infallible>(Event::default().event("connected").data("ok"))
    });

    let events = BroadcastStream::new(service.subscribe()).filter_map(|result| async move {
        match result {
            Ok(event) => Event::default()
                .event("order-ready")
                .json_data(&event)
                .ok()
                .map(Ok),
            Err(BroadcastStreamRecvError::Lagged(missed)) => Event::default()
                .event("lagged")
                .json_data(json!({ "missed": missed }))
                .ok()
                .map(Ok),
        }
    });

    Sse::new(connected.chain(events)).keep_alive(KeepAlive::default())
}

async fn debug_broker(State(service): State<WaiterService>) -> Json<Value> {
    let diagnostics = service.diagnostics();
    Json(json!({
        "listenerRunning": service.is_listener_running(),
        "messageCount": diagnostics.message_count(),
        "receivedOrderCount": service.received_orders().len(),
        "sinks": service.sink_names(),
        "broadcastChannel": service.broadcast_channel(),
        "errors": diagnostics.errors(),
        "rawMessages": diagnostics.raw_messages(),
    }))
}

async fn health() -> &'static str {
    "Waiter Service is running"
}
