use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use order_relay::api::kitchen::{self, KitchenState};
use order_relay::api::demo;
use order_relay::clients::{BroadcastSink, HttpOrderUpstream, OrderUpstream};
use order_relay::config::Config;
use order_relay::kitchen::{KitchenService, StatusCoordinator};
use order_relay::lifecycle::WaiterSystem;
use order_relay::mock::MockUpstream;
use order_relay::model::{
    entry_set, AuthContext, CacheEntrySet, NotificationEvent, OrderId, OrderItem, OrderSnapshot, OrderStatus,
    TableId,
};
use order_relay::OrderError;
use relay_framework::mock::MockPublisher;
use relay_framework::{CacheTier, LocalTier, Sink, TieredCache};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn snapshot(id: u64, status: OrderStatus) -> OrderSnapshot {
    OrderSnapshot::new(OrderId(id), TableId(100 + id), status, vec![OrderItem::new("Laksa", 1)], Utc::now())
}

struct Kitchen {
    router: Router,
    upstream: Arc<MockUpstream>,
    publisher: Arc<MockPublisher<NotificationEvent>>,
}

async fn kitchen(upstream: MockUpstream, cached: Vec<OrderSnapshot>) -> Kitchen {
    let upstream = Arc::new(upstream);
    let publisher = Arc::new(MockPublisher::<NotificationEvent>::recording());

    let tiers: Vec<Arc<dyn CacheTier<CacheEntrySet>>> = vec![Arc::new(LocalTier::new())];
    let cache = TieredCache::new(tiers, Duration::from_millis(50));
    cache.write(entry_set(cached)).await;

    let coordinator = StatusCoordinator::new(upstream.clone(), publisher.clone(), Duration::from_secs(3));
    let service = KitchenService::new(cache, coordinator, upstream.clone());
    let router = kitchen::router(KitchenState {
        service,
        config: Arc::new(Config::default()),
    });

    Kitchen {
        router,
        upstream,
        publisher,
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_get_orders_serves_the_cache() {
    let kitchen = kitchen(
        MockUpstream::new(),
        vec![snapshot(2, OrderStatus::Preparing), snapshot(1, OrderStatus::Created)],
    )
    .await;

    let response = kitchen
        .router
        .oneshot(Request::get("/api/kitchen/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["status"], "CREATED");
    assert_eq!(body[1]["tableId"], 102);
    assert_eq!(body.as_array().unwrap().len(), 2);
    kitchen.upstream.verify();
}

#[tokio::test]
async fn test_mark_ready_forwards_headers_and_publishes() {
    let mut upstream = MockUpstream::new();
    upstream.expect_update().return_ok(snapshot(7, OrderStatus::Ready));
    let kitchen = kitchen(upstream, vec![]).await;

    let request = Request::post("/api/kitchen/orders/7/ready")
        .header("Authorization", "Bearer abc")
        .header("X-User-Id", "chef-2")
        .header("X-Table-Id", "107")
        .body(Body::empty())
        .unwrap();
    let response = kitchen.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], 7);
    assert_eq!(body["status"], "READY");

    let calls = kitchen.upstream.update_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].status, OrderStatus::Ready);
    assert_eq!(
        calls[0].auth,
        AuthContext::new(
            Some("Bearer abc".to_string()),
            Some("chef-2".to_string()),
            Some("107".to_string())
        )
    );
    assert_eq!(kitchen.publisher.published().len(), 1);
}

#[tokio::test]
async fn test_rejection_maps_to_conflict() {
    let mut upstream = MockUpstream::new();
    upstream
        .expect_update()
        .return_err(OrderError::UpstreamRejected("order 7: 409 Conflict".to_string()));
    let kitchen = kitchen(upstream, vec![]).await;

    let response = kitchen
        .router
        .oneshot(Request::post("/api/kitchen/orders/7/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("409"));
    assert_eq!(kitchen.publisher.attempts(), 0);
}

#[tokio::test]
async fn test_unreachable_upstream_maps_to_service_unavailable() {
    let mut upstream = MockUpstream::new();
    upstream
        .expect_update()
        .return_err(OrderError::UpstreamUnavailable("connection refused".to_string()));
    let kitchen = kitchen(upstream, vec![]).await;

    let response = kitchen
        .router
        .oneshot(Request::post("/api/kitchen/orders/3/preparing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_confirmed_and_created_take_the_same_path() {
    let mut upstream = MockUpstream::new();
    upstream.expect_update().return_ok(snapshot(4, OrderStatus::Confirmed));
    upstream.expect_update().return_ok(snapshot(4, OrderStatus::Created));
    let kitchen = kitchen(upstream, vec![]).await;

    for path in ["/api/kitchen/orders/4/confirmed", "/api/kitchen/orders/4/created"] {
        let response = kitchen
            .router
            .clone()
            .oneshot(Request::post(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let statuses: Vec<OrderStatus> = kitchen.upstream.update_calls().iter().map(|c| c.status).collect();
    assert_eq!(statuses, vec![OrderStatus::Confirmed, OrderStatus::Created]);
    assert_eq!(kitchen.publisher.attempts(), 0);
}

#[tokio::test]
async fn test_generic_status_endpoint_validates_the_status() {
    let mut upstream = MockUpstream::new();
    upstream.expect_update().return_ok(snapshot(5, OrderStatus::Ready));
    let kitchen = kitchen(upstream, vec![]).await;

    let bogus = Request::post("/api/kitchen/orders/5/status")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"status": "SERVED"}"#))
        .unwrap();
    let response = kitchen.router.clone().oneshot(bogus).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(kitchen.upstream.update_calls().is_empty());

    let ready = Request::post("/api/kitchen/orders/5/status")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"status": "ready"}"#))
        .unwrap();
    let response = kitchen.router.clone().oneshot(ready).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(kitchen.publisher.published().len(), 1);
    kitchen.upstream.verify();
}

#[tokio::test]
async fn test_debug_status_reports_cache_and_probe() {
    let mut upstream = MockUpstream::new();
    upstream
        .expect_list()
        .return_err(OrderError::UpstreamUnavailable("connection refused".to_string()));
    let kitchen = kitchen(upstream, vec![snapshot(1, OrderStatus::Created)]).await;

    let response = kitchen
        .router
        .oneshot(Request::get("/api/kitchen/debug/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["cachedOrdersCount"], 1);
    assert_eq!(body["cacheTiers"][0], "local");
    assert!(body["orderService"]["status"].as_str().unwrap().starts_with("ERROR"));
}

#[tokio::test]
async fn test_waiter_lists_received_orders_and_diagnostics() {
    let broadcast = BroadcastSink::new("/topic/orders", 16);
    let sinks: Vec<Arc<dyn Sink<NotificationEvent>>> = vec![Arc::new(broadcast.clone())];
    let system = WaiterSystem::with_parts(broadcast, sinks, futures::stream::pending::<async_nats::Message>());
    let client = system.client();
    client
        .deliver(NotificationEvent::new(OrderId(1), TableId(101), vec![]))
        .await
        .unwrap();
    client
        .deliver(NotificationEvent::new(OrderId(2), TableId(102), vec![]))
        .await
        .unwrap();

    let response = system
        .router()
        .oneshot(Request::get("/api/waiter/received-orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body[0]["orderId"], 2);
    assert_eq!(body[1]["orderId"], 1);

    let response = system
        .router()
        .oneshot(Request::get("/api/waiter/debug/broker").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["receivedOrderCount"], 2);
    assert_eq!(body["sinks"][0], "broadcast");
    assert_eq!(body["broadcastChannel"], "/topic/orders");

    drop(client);
    system.shutdown().await.unwrap();
}

/// The HTTP adapter against the demo order service, over a real socket.
#[tokio::test]
async fn test_http_upstream_against_demo_service() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().nest("/api/waiter", demo::routes());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let upstream = HttpOrderUpstream::new(format!("http://{}/api/waiter", addr), Duration::from_secs(3)).unwrap();

    let active = upstream.list_active_orders().await.unwrap();
    let summary: Vec<(OrderId, OrderStatus)> = active.iter().map(|o| (o.id, o.status)).collect();
    assert_eq!(
        summary,
        vec![(OrderId(1), OrderStatus::Created), (OrderId(2), OrderStatus::Preparing)]
    );
    assert_eq!(active[0].items[0], OrderItem::new("BBQ Chicken Wings", 2));

    let updated = upstream
        .update_status(OrderId(7), OrderStatus::Ready, &AuthContext::default())
        .await
        .unwrap();
    assert_eq!(updated.id, OrderId(7));
    assert_eq!(updated.table_id, TableId(107));
    assert_eq!(updated.status, OrderStatus::Ready);
}
