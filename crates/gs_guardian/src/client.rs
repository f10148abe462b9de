use std::fmt;

use async_trait::async_trait;
use gs_core::config::GuardianConfig;
use gs_core::search::{PageLimits, SearchClient, SearchPage};
use gs_core::types::{RawArticle, SearchQuery, DATE_FORMAT};
use gs_core::{Error, Result, SearchError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = concat!("guardian-sqs/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct Envelope {
    response: Option<ResponseBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    status: Option<String>,
    message: Option<String>,
    current_page: Option<u32>,
    pages: Option<u32>,
    results: Option<Vec<Value>>,
}

/// Error bodies come either wrapped (`{"response": {"message": ..}}`) or bare
/// (`{"message": ..}`) depending on which layer rejected the call.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    response: Option<ResponseBody>,
}

/// Client for the Guardian content search endpoint.
pub struct GuardianClient {
    client: Client,
    search_url: Url,
    api_key: String,
    limits: PageLimits,
}

impl fmt::Debug for GuardianClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardianClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("search_url", &self.search_url.as_str())
            .field("limits", &self.limits)
            .finish()
    }
}

impl GuardianClient {
    pub fn new(config: &GuardianConfig) -> Result<Self> {
        config.validate()?;
        let search_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .and_then(|base| base.join("search"))
            .map_err(|e| Error::External(e.into()))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::External(e.into()))?;

        debug!("GuardianClient initialized for {}", search_url);
        Ok(Self {
            client,
            search_url,
            api_key: config.api_key.clone(),
            limits: PageLimits {
                page_size: config.page_size,
                max_articles: config.max_articles,
            },
        })
    }

    fn query_params(query: &SearchQuery, page: u32, page_size: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.text().to_string()),
            ("show-fields", "body".to_string()),
            ("page", page.to_string()),
            ("page-size", page_size.to_string()),
        ];
        if let Some(from) = query.date_from() {
            params.push(("from-date", from.format(DATE_FORMAT).to_string()));
        }
        if let Some(to) = query.date_to() {
            params.push(("to-date", to.format(DATE_FORMAT).to_string()));
        }
        params
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.message.or_else(|| e.response.and_then(|r| r.message)))
        .unwrap_or_else(|| body.trim().to_string())
}

fn classify_status(status: StatusCode, body: &str) -> SearchError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SearchError::AuthenticationError(message),
        s if s.is_server_error() => SearchError::UpstreamUnavailable(format!("{}: {}", s, message)),
        s => SearchError::RequestRejected {
            status: s.as_u16(),
            message,
        },
    }
}

/// Validates the envelope and extracts the result records of one page.
pub(crate) fn parse_page(page: u32, body: &[u8]) -> std::result::Result<SearchPage, SearchError> {
    let malformed = |reason: String| SearchError::MalformedResponse { page, reason };

    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
    let response = envelope
        .response
        .ok_or_else(|| malformed("'response' key not found".to_string()))?;

    match response.status.as_deref() {
        Some("ok") => {}
        other => {
            return Err(malformed(format!(
                "API returned a non-ok status: {}",
                other.unwrap_or("<none>")
            )))
        }
    }

    let results = response
        .results
        .ok_or_else(|| malformed("'results' key not found in response".to_string()))?
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            RawArticle::try_from(item).map_err(|_| malformed(format!("result {} is not an object", i)))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(SearchPage {
        current_page: response.current_page.unwrap_or(page),
        total_pages: response.pages,
        results,
    })
}

#[async_trait]
impl SearchClient for GuardianClient {
    fn limits(&self) -> PageLimits {
        self.limits
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
        page_size: u32,
    ) -> std::result::Result<SearchPage, SearchError> {
        let response = self
            .client
            .get(self.search_url.clone())
            .header("api-key", &self.api_key)
            .header("format", "json")
            .query(&Self::query_params(query, page, page_size))
            .send()
            .await
            .map_err(|e| SearchError::UpstreamUnavailable(format!("Error getting Guardian content: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::UpstreamUnavailable(format!("Error reading Guardian response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_status(status, &String::from_utf8_lossy(&body)));
        }

        let result = parse_page(page, &body)?;
        info!(
            "📰 Fetched page {}/{} with {} results",
            result.current_page,
            result.total_pages.map_or_else(|| "?".to_string(), |p| p.to_string()),
            result.results.len()
        );
        Ok(result)
    }
}
