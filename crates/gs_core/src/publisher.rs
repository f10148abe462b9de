use async_trait::async_trait;

use crate::error::PublishError;
use crate::types::{OutboundMessage, PublishReceipt};

pub type PublishResult = std::result::Result<PublishReceipt, PublishError>;

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Human readable name of the backend, used in logs.
    fn name(&self) -> &str;

    /// Sends one message. Implementations make exactly one delivery attempt.
    async fn publish(&self, message: &OutboundMessage) -> PublishResult;
}
