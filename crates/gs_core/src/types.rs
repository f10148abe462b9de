use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PublishError, QueryError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated search request. The only way to obtain one is through
/// [`SearchQuery::new`] or [`SearchQuery::parse`], so holders can rely on the
/// text being non-empty and the date range being ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn new(
        text: impl Into<String>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Self, QueryError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(QueryError::InvertedRange { from, to });
            }
        }
        Ok(Self { text, date_from, date_to })
    }

    /// Builds a query from raw `YYYY-MM-DD` strings as they arrive from the CLI.
    pub fn parse(
        text: impl Into<String>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Self, QueryError> {
        let date_from = date_from.map(|v| parse_date("date_from", v)).transpose()?;
        let date_to = date_to.map(|v| parse_date("date_to", v)).transpose()?;
        Self::new(text, date_from, date_to)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date_from(&self) -> Option<NaiveDate> {
        self.date_from
    }

    pub fn date_to(&self) -> Option<NaiveDate> {
        self.date_to
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| QueryError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// One search result exactly as the API returned it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawArticle(Map<String, Value>);

impl RawArticle {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value under `key` if it is a non-empty string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RawArticle {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for RawArticle {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// The canonical message placed on the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: String,
    pub title: String,
    pub url: String,
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl OutboundMessage {
    /// Serializes the message as a 4-space indented JSON document.
    pub fn to_payload(&self) -> Result<String, PublishError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| PublishError::SerializationError(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| PublishError::SerializationError(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub article_id: Option<String>,
    pub reason: String,
}

impl FailedItem {
    pub fn new(article_id: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            article_id: article_id.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// Outcome counts for one run. `attempted` is derived, so it always equals
/// `published + failed.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    published: usize,
    failed: Vec<FailedItem>,
}

impl PipelineSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&mut self) {
        self.published += 1;
    }

    pub fn record_failure(&mut self, item: FailedItem) {
        self.failed.push(item);
    }

    pub fn attempted(&self) -> usize {
        self.published + self.failed.len()
    }

    pub fn published(&self) -> usize {
        self.published
    }

    pub fn failed(&self) -> &[FailedItem] {
        &self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
