use async_trait::async_trait;
use common::domain::{AlertDestination, DomainResult, MessageSink};
use tracing::info;

/// Writes messages to the log. Used when no chat bridge is configured.
#[derive(Debug, Default, Clone)]
pub struct LogMessageSink;

#[async_trait]
impl MessageSink for LogMessageSink {
    async fn send(&self, destination: &AlertDestination, content: &str) -> DomainResult<()> {
        info!(destination = %destination, content, "outbound message");
        Ok(())
    }
}
