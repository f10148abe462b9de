use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gs_core::{MessagePublisher, OutboundMessage, PublishError, PublishReceipt, PublishResult};
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub message_id: String,
    pub article_id: String,
    pub payload: String,
}

/// In-process queue. Used for dry runs and as a test double. Every stored
/// payload is logged, which is how a dry run shows what would have been sent.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: RwLock<Vec<StoredMessage>>,
    attempts: AtomicUsize,
    fail_attempts: HashSet<usize>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given 1-based publish attempts fail with `QueueUnavailable`.
    pub fn failing_on(attempts: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_attempts: attempts.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn messages(&self) -> Vec<StoredMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl MessagePublisher for MemoryPublisher {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(&self, message: &OutboundMessage) -> PublishResult {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = message.to_payload()?;

        if self.fail_attempts.contains(&attempt) {
            return Err(PublishError::QueueUnavailable(format!(
                "simulated failure on attempt {}",
                attempt
            )));
        }

        let mut messages = self.messages.write().await;
        let message_id = format!("memory-{}", messages.len() + 1);
        info!("📝 Stored {} as {}\n{}", message.id, message_id, payload);
        messages.push(StoredMessage {
            message_id: message_id.clone(),
            article_id: message.id.clone(),
            payload,
        });
        Ok(PublishReceipt { message_id })
    }
}
