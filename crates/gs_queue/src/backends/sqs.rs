use std::fmt;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::retry::RetryConfig;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client;
use gs_core::config::QueueConfig;
use gs_core::{MessagePublisher, OutboundMessage, PublishError, PublishReceipt, PublishResult, Result};
use tracing::debug;

/// Publishes each message with a single `SendMessage` call.
///
/// SDK level retries are disabled so a call to [`MessagePublisher::publish`]
/// never results in more than one delivery attempt.
pub struct SqsPublisher {
    client: Client,
    queue_url: String,
}

impl fmt::Debug for SqsPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsPublisher")
            .field("client", &"<aws_sdk_sqs::Client>")
            .field("queue_url", &self.queue_url)
            .finish()
    }
}

impl SqsPublisher {
    pub async fn new(config: &QueueConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        debug!("SqsPublisher initialized for {}", config.queue_url);
        Ok(Self::from_client(Client::new(&sdk_config), &config.queue_url))
    }

    /// Wraps an already configured client.
    pub fn from_client(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

/// Hex MD5 of the body, as SQS reports it in `MD5OfMessageBody`.
pub fn body_md5(body: &str) -> String {
    format!("{:x}", md5::compute(body.as_bytes()))
}

pub fn verify_md5(body: &str, reported: Option<&str>) -> std::result::Result<(), PublishError> {
    let expected = body_md5(body);
    match reported {
        Some(actual) if actual.eq_ignore_ascii_case(&expected) => Ok(()),
        other => Err(PublishError::ChecksumMismatch {
            expected,
            actual: other.unwrap_or("<none>").to_string(),
        }),
    }
}

#[async_trait]
impl MessagePublisher for SqsPublisher {
    fn name(&self) -> &str {
        "sqs"
    }

    async fn publish(&self, message: &OutboundMessage) -> PublishResult {
        let body = message.to_payload()?;

        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(&body)
            .send()
            .await
            .map_err(|e| {
                PublishError::QueueUnavailable(format!(
                    "Failed to send SQS message: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        verify_md5(&body, output.md5_of_message_body())?;
        let message_id = output
            .message_id()
            .ok_or(PublishError::MissingMessageId)?
            .to_string();

        debug!("📬 Sent {} as SQS message {}", message.id, message_id);
        Ok(PublishReceipt { message_id })
    }
}
