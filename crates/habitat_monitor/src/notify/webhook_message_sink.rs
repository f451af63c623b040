use async_trait::async_trait;
use common::domain::{AlertDestination, DomainError, DomainResult, MessageSink};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    channel_id: &'a str,
    content: &'a str,
}

/// Delivers messages by POSTing `{"channel_id", "content"}` to a chat bridge.
pub struct WebhookMessageSink {
    client: Client,
    url: String,
}

impl WebhookMessageSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::DispatchError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl MessageSink for WebhookMessageSink {
    #[instrument(skip(self, content), fields(url = %self.url, destination = %destination))]
    async fn send(&self, destination: &AlertDestination, content: &str) -> DomainResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookMessage {
                channel_id: destination.as_str(),
                content,
            })
            .send()
            .await
            .map_err(|e| DomainError::DispatchError(format!("webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::DispatchError(format!(
                "webhook answered {}",
                status
            )));
        }

        debug!(%status, "message delivered");
        Ok(())
    }
}
