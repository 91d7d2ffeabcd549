use crate::model::NotificationEvent;
use async_trait::async_trait;
use relay_framework::{FrameworkError, Sink};
use std::time::Duration;
use tracing::{debug, instrument};

/// Posts each ready notification as JSON to an external URL.
///
/// A non-2xx answer counts as a failed delivery. There is no retry.
pub struct WebhookSink {
    http: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Sink<NotificationEvent> for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip_all, fields(order_id = %event.order_id))]
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), FrameworkError> {
        let response = self
            .http
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| FrameworkError::sink("webhook", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FrameworkError::sink("webhook", format!("{} answered {}", self.url, status)));
        }
        debug!(%status, "Webhook delivered");
        Ok(())
    }
}
