use crate::error::OrderError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure of an HTTP request, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// The caller sent something we cannot act on.
    BadRequest(String),
    Order(OrderError),
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        ApiError::Order(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Order(OrderError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Order(OrderError::UpstreamRejected(_)) => StatusCode::CONFLICT,
            ApiError::Order(OrderError::UpstreamUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Order(
                OrderError::MalformedResponse(_) | OrderError::UnknownStatus(_) | OrderError::InvalidItem { .. },
            ) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Order(e) => e.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
