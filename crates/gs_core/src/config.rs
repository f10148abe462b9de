use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_GUARDIAN_URL: &str = "https://content.guardianapis.com";
/// The Guardian API refuses page sizes above 50.
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Clone)]
pub struct GuardianConfig {
    pub api_key: String,
    pub base_url: String,
    pub page_size: u32,
    pub max_articles: Option<usize>,
    pub timeout: Duration,
}

impl GuardianConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GUARDIAN_URL.to_string(),
            page_size: MAX_PAGE_SIZE,
            max_articles: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_articles(mut self, max_articles: Option<usize>) -> Self {
        self.max_articles = max_articles;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSetting("GUARDIAN_KEY"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidSetting {
                name: "page_size",
                reason: format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, self.page_size),
            });
        }
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidSetting {
            name: "guardian_base_url",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

impl fmt::Debug for GuardianConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardianConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("max_articles", &self.max_articles)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub queue_url: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

impl QueueConfig {
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            region: None,
            endpoint_url: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_url.trim().is_empty() {
            return Err(ConfigError::MissingSetting("SQS_QUEUE_URL"));
        }
        url::Url::parse(&self.queue_url).map_err(|e| ConfigError::InvalidSetting {
            name: "SQS_QUEUE_URL",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Controls when per-item failures escalate into a fatal abort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailurePolicy {
    /// `None` never escalates.
    pub max_consecutive_failures: Option<u32>,
}

impl FailurePolicy {
    pub fn never_escalate() -> Self {
        Self::default()
    }

    pub fn abort_after(consecutive: u32) -> Self {
        Self {
            max_consecutive_failures: Some(consecutive.max(1)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub guardian: GuardianConfig,
    /// `None` when publishing to an in-memory queue.
    pub queue: Option<QueueConfig>,
    pub policy: FailurePolicy,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.guardian.validate()?;
        if let Some(queue) = &self.queue {
            queue.validate()?;
        }
        Ok(())
    }
}
