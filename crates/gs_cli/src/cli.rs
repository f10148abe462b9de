use std::time::Duration;

use clap::Parser;
use gs_core::config::{DEFAULT_GUARDIAN_URL, MAX_PAGE_SIZE};
use gs_core::{
    ConfigError, FailurePolicy, GuardianConfig, PipelineConfig, QueryError, QueueConfig,
    SearchQuery,
};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Extract articles from The Guardian and publish them to AWS SQS",
    long_about = None
)]
pub struct Cli {
    /// Search query for retrieving Guardian articles
    pub query: String,

    /// Start date for filtering articles (format: YYYY-MM-DD)
    #[arg(long)]
    pub date_from: Option<String>,

    /// End date for filtering articles (format: YYYY-MM-DD)
    #[arg(long)]
    pub date_to: Option<String>,

    /// Stop after forwarding this many articles
    #[arg(long)]
    pub max_articles: Option<usize>,

    /// Results requested per page (1-50)
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: u32,

    /// Abort the run after this many failures in a row
    #[arg(long)]
    pub max_consecutive_failures: Option<u32>,

    /// Publish to an in-memory queue and print the payloads instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Guardian content API base URL
    #[arg(long, env = "GUARDIAN_BASE_URL", default_value = DEFAULT_GUARDIAN_URL)]
    pub guardian_base_url: String,

    /// HTTP timeout for search requests in seconds
    #[arg(long, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Guardian API key
    #[arg(long, env = "GUARDIAN_KEY", hide_env_values = true)]
    pub guardian_key: Option<String>,

    /// URL of the target SQS queue
    #[arg(long, env = "SQS_QUEUE_URL")]
    pub sqs_queue_url: Option<String>,

    /// AWS region of the queue
    #[arg(long, env = "AWS_REGION")]
    pub aws_region: Option<String>,

    /// Override for the SQS endpoint (e.g. LocalStack)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub aws_endpoint_url: Option<String>,
}

impl Cli {
    pub fn search_query(&self) -> Result<SearchQuery, QueryError> {
        SearchQuery::parse(
            self.query.as_str(),
            self.date_from.as_deref(),
            self.date_to.as_deref(),
        )
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let api_key = self
            .guardian_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingSetting("GUARDIAN_KEY"))?;

        let guardian = GuardianConfig::new(api_key)
            .with_base_url(self.guardian_base_url.as_str())
            .with_page_size(self.page_size)
            .with_max_articles(self.max_articles)
            .with_timeout(Duration::from_secs(self.http_timeout_secs));

        let queue = if self.dry_run {
            None
        } else {
            let queue_url = self
                .sqs_queue_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .ok_or(ConfigError::MissingSetting("SQS_QUEUE_URL"))?;
            Some(QueueConfig {
                queue_url,
                region: self.aws_region.clone(),
                endpoint_url: self.aws_endpoint_url.clone(),
            })
        };

        let policy = match self.max_consecutive_failures {
            Some(limit) => FailurePolicy::abort_after(limit),
            None => FailurePolicy::never_escalate(),
        };

        let config = PipelineConfig { guardian, queue, policy };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["guardian-sqs"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_query_and_dates() {
        let cli = parse(&["climate change", "--date-from", "2023-01-01", "--date-to", "2023-01-31"]);
        let query = cli.search_query().unwrap();
        assert_eq!(query.text(), "climate change");
        assert_eq!(query.date_from().unwrap().to_string(), "2023-01-01");
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let cli = parse(&["climate", "--date-from", "01/02/2023"]);
        assert!(matches!(cli.search_query(), Err(QueryError::InvalidDate { field: "date_from", .. })));
    }

    #[test]
    fn test_inverted_dates_are_rejected_before_config() {
        let cli = parse(&["climate", "--date-from", "2023-03-01", "--date-to", "2023-01-01"]);
        assert!(matches!(cli.search_query(), Err(QueryError::InvertedRange { .. })));
    }

    #[test]
    fn test_query_is_required() {
        assert!(Cli::try_parse_from(["guardian-sqs"]).is_err());
    }

    #[test]
    fn test_dry_run_needs_no_queue() {
        let cli = parse(&["climate", "--dry-run", "--guardian-key", "k", "--max-consecutive-failures", "3"]);
        let config = cli.pipeline_config().unwrap();
        assert!(config.queue.is_none());
        assert_eq!(config.policy.max_consecutive_failures, Some(3));
        assert_eq!(config.guardian.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_queue_settings_are_forwarded() {
        let cli = parse(&[
            "climate",
            "--guardian-key",
            "k",
            "--sqs-queue-url",
            "https://sqs.eu-west-2.amazonaws.com/123/articles",
            "--aws-region",
            "eu-west-2",
        ]);
        let queue = cli.pipeline_config().unwrap().queue.unwrap();
        assert_eq!(queue.region.as_deref(), Some("eu-west-2"));
        assert!(queue.queue_url.ends_with("/articles"));
    }

    #[test]
    fn test_invalid_page_size_is_config_error() {
        let cli = parse(&["climate", "--dry-run", "--guardian-key", "k", "--page-size", "200"]);
        assert!(matches!(
            cli.pipeline_config(),
            Err(ConfigError::InvalidSetting { name: "page_size", .. })
        ));
    }
}
