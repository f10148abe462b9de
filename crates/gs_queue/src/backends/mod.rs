pub mod memory;
pub mod sqs;

pub use memory::{MemoryPublisher, StoredMessage};
pub use sqs::SqsPublisher;
