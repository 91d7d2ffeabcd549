use crate::error::OrderError;
use crate::model::{AuthContext, OrderId, OrderSnapshot, OrderStatus, RawOrderRecord};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const TABLE_ID_HEADER: &str = "X-Table-Id";

/// The upstream order-management system.
///
/// Errors are classified so callers can tell "not found", "rejected" and
/// "transient/network" apart.
#[async_trait]
pub trait OrderUpstream: Send + Sync + 'static {
    /// Lists every order the upstream currently considers active.
    async fn list_active_orders(&self) -> Result<Vec<OrderSnapshot>, OrderError>;

    /// Asks the upstream to move `order_id` to `status`, forwarding `auth` verbatim.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        auth: &AuthContext,
    ) -> Result<OrderSnapshot, OrderError>;
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
}

/// [`OrderUpstream`] over HTTP.
///
/// Every request carries the client-wide timeout given to [`HttpOrderUpstream::new`].
#[derive(Clone)]
pub struct HttpOrderUpstream {
    http: reqwest::Client,
    base_url: String,
}

impl HttpOrderUpstream {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OrderError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl OrderUpstream for HttpOrderUpstream {
    #[instrument(skip(self))]
    async fn list_active_orders(&self) -> Result<Vec<OrderSnapshot>, OrderError> {
        let url = format!("{}/orders/active", self.base_url);
        let response = self.http.get(&url).send().await?;
        let records: Vec<RawOrderRecord> = decode(response, "active orders").await?;
        debug!(count = records.len(), "Fetched active orders");

        records.into_iter().map(OrderSnapshot::try_from).collect()
    }

    #[instrument(skip_all, fields(order_id = %order_id, status = %status))]
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        auth: &AuthContext,
    ) -> Result<OrderSnapshot, OrderError> {
        let url = format!("{}/orders/{}/status", self.base_url, order_id);
        let mut request = self.http.post(&url).json(&StatusUpdate {
            status: status.as_str(),
        });
        if let Some(value) = &auth.authorization {
            request = request.header(AUTHORIZATION, value.as_str());
        }
        if let Some(value) = &auth.user_id {
            request = request.header(USER_ID_HEADER, value.as_str());
        }
        if let Some(value) = &auth.table_id {
            request = request.header(TABLE_ID_HEADER, value.as_str());
        }

        let response = request.send().await?;
        let record: RawOrderRecord = decode(response, &format!("order {}", order_id)).await?;
        info!("Upstream accepted status update");

        OrderSnapshot::try_from(record)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T, OrderError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(classify(status, what, &String::from_utf8_lossy(&body)));
    }
    serde_json::from_slice(&body).map_err(|e| OrderError::MalformedResponse(format!("{}: {}", what, e)))
}

/// Maps a non-success upstream status onto the error taxonomy.
pub fn classify(status: StatusCode, what: &str, body: &str) -> OrderError {
    let detail = if body.trim().is_empty() {
        format!("{}: {}", what, status)
    } else {
        format!("{}: {} {}", what, status, body.trim())
    };
    match status {
        StatusCode::NOT_FOUND => OrderError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            OrderError::UpstreamRejected(detail)
        }
        _ => OrderError::UpstreamUnavailable(detail),
    }
}
