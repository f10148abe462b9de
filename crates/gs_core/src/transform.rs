use chrono::{DateTime, Utc};
use scraper::Html;
use serde_json::Map;

use crate::error::TransformError;
use crate::types::{OutboundMessage, RawArticle};

pub const PREVIEW_CHARS: usize = 1000;
pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const ID_KEY: &str = "id";
const TITLE_KEY: &str = "webTitle";
const URL_KEY: &str = "webUrl";
const PUBLISHED_KEY: &str = "webPublicationDate";
const SECTION_KEY: &str = "sectionName";
const FIELDS_KEY: &str = "fields";
const BODY_KEY: &str = "body";

/// Keys consumed by the canonical fields and therefore not passed through.
const MAPPED_KEYS: [&str; 6] = [ID_KEY, TITLE_KEY, URL_KEY, PUBLISHED_KEY, SECTION_KEY, FIELDS_KEY];

/// Names of the canonical output fields. A raw key with one of these names
/// would end up next to the canonical value in the flattened payload.
const CANONICAL_KEYS: [&str; 6] = ["id", "title", "url", "published_at", "section", "content_preview"];

/// Maps Guardian search results onto [`OutboundMessage`].
#[derive(Debug, Clone, Copy)]
pub struct ArticleTransformer {
    preview_chars: usize,
}

impl Default for ArticleTransformer {
    fn default() -> Self {
        Self { preview_chars: PREVIEW_CHARS }
    }
}

impl ArticleTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self, raw: &RawArticle) -> Result<OutboundMessage, TransformError> {
        let article_id = raw.id();
        let require = |key: &str, field: &'static str| {
            raw.get_str(key).ok_or_else(|| TransformError::IncompleteArticle {
                article_id: article_id.map(str::to_string),
                field,
            })
        };

        let id = require(ID_KEY, "id")?;
        let title = require(TITLE_KEY, "title")?;
        let url = require(URL_KEY, "url")?;
        let published = require(PUBLISHED_KEY, "published_at")?;

        let published_at = DateTime::parse_from_rfc3339(published)
            .map_err(|e| TransformError::InvalidField {
                article_id: Some(id.to_string()),
                field: "published_at",
                reason: e.to_string(),
            })?
            .with_timezone(&Utc)
            .format(PUBLISHED_AT_FORMAT)
            .to_string();

        let content_preview = raw
            .get(FIELDS_KEY)
            .and_then(|fields| fields.get(BODY_KEY))
            .and_then(|body| body.as_str())
            .and_then(|body| content_preview(body, self.preview_chars));

        let passthrough: Map<_, _> = raw
            .fields()
            .iter()
            .filter(|(key, _)| {
                !MAPPED_KEYS.contains(&key.as_str()) && !CANONICAL_KEYS.contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(OutboundMessage {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            published_at,
            section: raw.get_str(SECTION_KEY).map(str::to_string),
            content_preview,
            passthrough,
        })
    }
}

/// Plain text of an HTML body, whitespace collapsed, at most `max_chars`
/// characters and never ending in a partial word.
pub fn content_preview(html: &str, max_chars: usize) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let text = fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= max_chars {
        return Some(text);
    }

    let cut: String = text.chars().take(max_chars).collect();
    let preview = match cut.rfind(' ') {
        Some(idx) => cut[..idx].to_string(),
        None => cut,
    };
    Some(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawArticle {
        RawArticle::try_from(value).unwrap()
    }

    fn guardian_result() -> RawArticle {
        raw(json!({
            "id": "world/2022/oct/21/russia-ukraine-war-latest",
            "type": "article",
            "sectionId": "world",
            "sectionName": "World news",
            "webPublicationDate": "2022-10-21T14:06:14Z",
            "webTitle": "Russia-Ukraine war latest",
            "webUrl": "https://www.theguardian.com/world/2022/oct/21/russia-ukraine-war-latest",
            "apiUrl": "https://content.guardianapis.com/world/2022/oct/21/russia-ukraine-war-latest",
            "isHosted": false,
            "pillarId": "pillar/news",
            "pillarName": "News",
            "fields": {"body": "<p>Day 240 of the <strong>invasion</strong>.</p>"}
        }))
    }

    #[test]
    fn test_transform_maps_canonical_fields() {
        let message = ArticleTransformer::new().transform(&guardian_result()).unwrap();
        assert_eq!(message.id, "world/2022/oct/21/russia-ukraine-war-latest");
        assert_eq!(message.title, "Russia-Ukraine war latest");
        assert_eq!(message.published_at, "2022-10-21T14:06:14Z");
        assert_eq!(message.section.as_deref(), Some("World news"));
        assert_eq!(message.content_preview.as_deref(), Some("Day 240 of the invasion ."));
    }

    #[test]
    fn test_transform_passes_through_unmapped_fields() {
        let message = ArticleTransformer::new().transform(&guardian_result()).unwrap();
        assert_eq!(message.passthrough["pillarName"], "News");
        assert_eq!(message.passthrough["isHosted"], false);
        for key in MAPPED_KEYS {
            assert!(!message.passthrough.contains_key(key), "{} leaked", key);
        }
    }

    #[test]
    fn test_raw_keys_cannot_shadow_canonical_fields() {
        let mut fields = guardian_result().fields().clone();
        fields.remove(SECTION_KEY);
        for (key, value) in [
            ("title", "Other title"),
            ("url", "https://example.com/elsewhere"),
            ("published_at", "1999-01-01T00:00:00Z"),
            ("section", "Other section"),
            ("content_preview", "Other preview"),
        ] {
            fields.insert(key.into(), json!(value));
        }

        let message = ArticleTransformer::new().transform(&RawArticle::new(fields)).unwrap();
        assert_eq!(message.section, None);
        for key in CANONICAL_KEYS {
            assert!(!message.passthrough.contains_key(key), "{} leaked", key);
        }

        let payload = message.to_payload().unwrap();
        for key in CANONICAL_KEYS {
            let occurrences = payload.matches(&format!("\"{}\":", key)).count();
            assert!(occurrences <= 1, "{} appears {} times", key, occurrences);
        }
        let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed["title"], "Russia-Ukraine war latest");
        assert_eq!(parsed["url"], "https://www.theguardian.com/world/2022/oct/21/russia-ukraine-war-latest");
        assert_eq!(parsed["published_at"], "2022-10-21T14:06:14Z");
        assert!(parsed.get("section").is_none());
        assert_eq!(parsed["pillarName"], "News");
    }

    #[test]
    fn test_transform_normalises_offset_to_utc() {
        let mut fields = guardian_result().fields().clone();
        fields.insert(PUBLISHED_KEY.into(), json!("2023-01-01T02:30:00+02:00"));
        let message = ArticleTransformer::new().transform(&RawArticle::new(fields)).unwrap();
        assert_eq!(message.published_at, "2023-01-01T00:30:00Z");
    }

    #[test]
    fn test_missing_title_is_incomplete() {
        let mut fields = guardian_result().fields().clone();
        fields.remove(TITLE_KEY);
        let err = ArticleTransformer::new().transform(&RawArticle::new(fields)).unwrap_err();
        assert_eq!(err.to_string(), "missing field: title");
        assert_eq!(err.article_id(), Some("world/2022/oct/21/russia-ukraine-war-latest"));
    }

    #[test]
    fn test_each_required_field_is_checked() {
        for (key, field) in [(ID_KEY, "id"), (URL_KEY, "url"), (PUBLISHED_KEY, "published_at")] {
            let mut fields = guardian_result().fields().clone();
            fields.insert(key.into(), serde_json::Value::Null);
            let err = ArticleTransformer::new().transform(&RawArticle::new(fields)).unwrap_err();
            assert!(matches!(err, TransformError::IncompleteArticle { field: f, .. } if f == field));
        }
    }

    #[test]
    fn test_bad_timestamp_is_invalid_field() {
        let mut fields = guardian_result().fields().clone();
        fields.insert(PUBLISHED_KEY.into(), json!("yesterday"));
        let err = ArticleTransformer::new().transform(&RawArticle::new(fields)).unwrap_err();
        assert!(matches!(err, TransformError::InvalidField { field: "published_at", .. }));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let transformer = ArticleTransformer::new();
        let article = guardian_result();
        let first = transformer.transform(&article).unwrap();
        let second = transformer.transform(&article).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_payload().unwrap(), second.to_payload().unwrap());
    }

    #[test]
    fn test_preview_ends_on_word_boundary() {
        let body = format!("<p>{}</p>", "lorem ipsum ".repeat(200));
        let preview = content_preview(&body, 20).unwrap();
        assert_eq!(preview, "lorem ipsum lorem");
    }

    #[test]
    fn test_preview_of_empty_body() {
        assert_eq!(content_preview("<div>  </div>", PREVIEW_CHARS), None);
        assert_eq!(content_preview("", PREVIEW_CHARS), None);
    }
}
