//! # Mock Upstream
//!
//! A scripted [`OrderUpstream`] for testing the kitchen side without an order service.
//!
//! ```ignore
//! let mut upstream = MockUpstream::new();
//! upstream.expect_list().return_ok(vec![snapshot]);
//! upstream.expect_update().return_err(OrderError::UpstreamRejected("409".into()));
//!
//! // hand `Arc::new(upstream)` to the code under test...
//! upstream.verify(); // Ensures all expectations were met
//! ```
//!
//! Calls are answered in the order the expectations were added, per operation. A call
//! with no expectation left panics.

use crate::clients::OrderUpstream;
use crate::error::OrderError;
use crate::model::{AuthContext, OrderId, OrderSnapshot, OrderStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responses<T> = Arc<Mutex<VecDeque<(Option<Duration>, Result<T, OrderError>)>>>;

/// One recorded `update_status` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub auth: AuthContext,
}

#[derive(Default)]
pub struct MockUpstream {
    lists: Responses<Vec<OrderSnapshot>>,
    updates: Responses<OrderSnapshot>,
    update_calls: Mutex<Vec<UpdateCall>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one `list_active_orders` call.
    pub fn expect_list(&mut self) -> ExpectationBuilder<Vec<OrderSnapshot>> {
        ExpectationBuilder {
            delay: None,
            responses: self.lists.clone(),
        }
    }

    /// Expects one `update_status` call.
    pub fn expect_update(&mut self) -> ExpectationBuilder<OrderSnapshot> {
        ExpectationBuilder {
            delay: None,
            responses: self.updates.clone(),
        }
    }

    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.update_calls.lock().unwrap().clone()
    }

    /// Panics if any expectation was not consumed.
    pub fn verify(&self) {
        let lists = self.lists.lock().unwrap().len();
        let updates = self.updates.lock().unwrap().len();
        assert_eq!(lists, 0, "{} expected list call(s) never happened", lists);
        assert_eq!(updates, 0, "{} expected update call(s) never happened", updates);
    }
}

pub struct ExpectationBuilder<T> {
    delay: Option<Duration>,
    responses: Responses<T>,
}

impl<T> ExpectationBuilder<T> {
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn return_ok(self, value: T) {
        self.responses.lock().unwrap().push_back((self.delay, Ok(value)));
    }

    pub fn return_err(self, error: OrderError) {
        self.responses.lock().unwrap().push_back((self.delay, Err(error)));
    }
}

async fn next<T>(responses: &Responses<T>, operation: &str) -> Result<T, OrderError> {
    let next = responses.lock().unwrap().pop_front();
    let Some((delay, response)) = next else {
        panic!("Unexpected {}: no expectation set", operation);
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    response
}

#[async_trait]
impl OrderUpstream for MockUpstream {
    async fn list_active_orders(&self) -> Result<Vec<OrderSnapshot>, OrderError> {
        next(&self.lists, "list_active_orders").await
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        auth: &AuthContext,
    ) -> Result<OrderSnapshot, OrderError> {
        self.update_calls.lock().unwrap().push(UpdateCall {
            order_id,
            status,
            auth: auth.clone(),
        });
        next(&self.updates, "update_status").await
    }
}
