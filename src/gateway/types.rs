use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::{is_blank, preview, validate_source_url};

/// Stable backend identifier of an article.
pub type ArticleId = i64;

/// Category shown for articles the backend left uncategorized.
pub const DEFAULT_CATEGORY: &str = "General";

/// Number of summary characters shown in list views.
pub const SUMMARY_PREVIEW_CHARS: usize = 150;

// ============================================================================
// Sentiment
// ============================================================================

/// Tone label attached to each article by the backend's classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Parse a backend label leniently.
    ///
    /// Exact names match case-insensitively first. Classifier output is
    /// sometimes a phrase ("Mostly positive.") so a label containing
    /// "positive" or "negative" is accepted next. Anything else, including an
    /// absent label, is `Neutral`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Sentiment::Neutral;
        };
        let clean = raw.trim().to_lowercase();
        match clean.as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            other if other.contains("positive") => Sentiment::Positive,
            other if other.contains("negative") => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }

    /// Every sentiment a filter can select, in display order.
    pub const ALL: [Sentiment; 3] = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Neutral,
    ];
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Article
// ============================================================================

/// A news article as the rest of the crate sees it.
///
/// Every optional wire field has already been defaulted, so downstream code
/// never branches on presence: an uncategorized article has an empty
/// `category`, a missing summary is empty, an unknown sentiment is `Neutral`.
///
/// String fields use `Arc<str>` so the filtered and paged views can clone
/// articles without copying bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: ArticleId,
    pub title: Arc<str>,
    pub summary: Arc<str>,
    pub content: Arc<str>,
    pub category: Arc<str>,
    pub sentiment: Sentiment,
    pub source_url: Arc<str>,
    pub published: Option<DateTime<Utc>>,
}

impl Article {
    /// Category label for display, falling back to "General".
    pub fn display_category(&self) -> &str {
        if is_blank(&self.category) {
            DEFAULT_CATEGORY
        } else {
            &self.category
        }
    }

    /// First 150 characters of the summary, with "..." when cut.
    pub fn summary_preview(&self) -> std::borrow::Cow<'_, str> {
        preview(&self.summary, SUMMARY_PREVIEW_CHARS)
    }

    /// Source link, if it is a well-formed http(s) URL.
    pub fn source_link(&self) -> Option<url::Url> {
        validate_source_url(&self.source_url).ok()
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Article exactly as the backend serializes it. Only `id` is mandatory.
#[derive(Debug, Deserialize)]
pub(crate) struct ArticlePayload {
    pub id: ArticleId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<ArticlePayload> for Article {
    fn from(p: ArticlePayload) -> Self {
        let published = p.created_at.as_deref().and_then(parse_timestamp);
        Article {
            id: p.id,
            title: Arc::from(p.title.unwrap_or_default()),
            summary: Arc::from(p.summary.unwrap_or_default()),
            content: Arc::from(p.content.unwrap_or_default()),
            category: Arc::from(p.category.unwrap_or_default()),
            sentiment: Sentiment::parse(p.sentiment.as_deref()),
            source_url: Arc::from(p.source_url.unwrap_or_default()),
            published,
        }
    }
}

/// Parse a backend timestamp. The backend emits naive UTC datetimes
/// (`2024-05-01T10:20:30.123456`); RFC 3339 with an offset is accepted too.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            tracing::debug!(raw = %raw, error = %e, "Unparseable article timestamp, leaving unset");
            None
        }
    }
}

/// Body of `POST /api/preferences/`.
#[derive(Debug, Serialize)]
pub(crate) struct SavePreferencesRequest<'a> {
    pub categories: &'a [String],
}
