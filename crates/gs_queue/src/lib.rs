use std::sync::Arc;

use gs_core::config::QueueConfig;
use gs_core::{MessagePublisher, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

/// Builds the publisher for `queue`; `None` selects the in-memory backend.
pub async fn create_publisher(queue: Option<&QueueConfig>) -> Result<Arc<dyn MessagePublisher>> {
    let publisher: Arc<dyn MessagePublisher> = match queue {
        Some(config) => Arc::new(SqsPublisher::new(config).await?),
        None => Arc::new(MemoryPublisher::new()),
    };
    info!("📮 Publisher initialized (using {})", publisher.name());
    Ok(publisher)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_publisher;
}
