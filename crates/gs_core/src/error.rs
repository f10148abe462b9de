use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("search text must not be empty")]
    EmptyQuery,

    #[error("invalid date for {field}: {value} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("date_from {from} is later than date_to {to}")]
    InvertedRange { from: chrono::NaiveDate, to: chrono::NaiveDate },
}

/// Errors produced while paging through the search API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("authentication failed: {0}")]
    AuthenticationError(String),

    #[error("search API unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("search API rejected the request ({status}): {message}")]
    RequestRejected { status: u16, message: String },

    #[error("malformed response on page {page}: {reason}")]
    MalformedResponse { page: u32, reason: String },
}

impl SearchError {
    /// Fatal errors halt the whole run; everything else is scoped to one page.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SearchError::MalformedResponse { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("missing field: {field}")]
    IncompleteArticle {
        article_id: Option<String>,
        field: &'static str,
    },

    #[error("invalid field {field}: {reason}")]
    InvalidField {
        article_id: Option<String>,
        field: &'static str,
        reason: String,
    },
}

impl TransformError {
    pub fn article_id(&self) -> Option<&str> {
        match self {
            TransformError::IncompleteArticle { article_id, .. }
            | TransformError::InvalidField { article_id, .. } => article_id.as_deref(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("MD5 mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("queue accepted the message but returned no message id")]
    MissingMessageId,
}

/// Errors that end a pipeline run early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error(transparent)]
    Search(SearchError),

    #[error("aborting after {0} consecutive failures")]
    TooManyConsecutiveFailures(u32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Fatal error: {0}")]
    Fatal(#[from] FatalError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
