pub mod config;
pub mod error;
pub mod publisher;
pub mod search;
pub mod transform;
pub mod types;

pub use config::{FailurePolicy, GuardianConfig, PipelineConfig, QueueConfig};
pub use error::{
    ConfigError, Error, FatalError, PublishError, QueryError, SearchError, TransformError,
};
pub use publisher::{MessagePublisher, PublishResult};
pub use search::{paginate, ArticleStream, PageLimits, SearchClient, SearchPage};
pub use transform::ArticleTransformer;
pub use types::{
    FailedItem, OutboundMessage, PipelineSummary, PublishReceipt, RawArticle, SearchQuery,
};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use super::{
        ArticleTransformer, MessagePublisher, OutboundMessage, RawArticle, SearchClient,
        SearchQuery,
    };
    pub use super::{Error, Result};
}
