//! Data models shared across the ingestion pipeline.
//!
//! - [`Article`]: one normalized feed item, the pipeline's output unit
//! - [`FetchTask`]: a (feed URL, source label) pair to ingest
//! - [`Topic`]: a registry entry that expands into fetch tasks
//! - [`IngestReport`]: the serialized result of one run
//!
//! Every model is created fresh per run and discarded after the run's output
//! is returned; nothing here is persisted.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A normalized article produced by the pipeline.
///
/// Construct through [`Article::new`], which enforces the invariants: the
/// title is never empty, the summary falls back to the title, and `published`
/// is always a valid ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// The item headline, trimmed.
    pub title: String,
    /// Plain-text summary with markup removed and length capped.
    pub summary: String,
    /// Absolute URL of the article, empty when the source omits it.
    pub link: String,
    /// Publication time in ISO-8601 (UTC, millisecond precision).
    pub published: String,
    /// Display label from the caller's topic configuration.
    pub source: String,
    /// Lead image, when the feed item advertises one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Effective date used for recency filtering only.
    #[serde(skip)]
    pub(crate) raw_date: DateTime<Utc>,
}

impl Article {
    /// Build an article from already-cleaned parts.
    ///
    /// Returns `None` when the title is blank. An empty `summary` is replaced
    /// by the title.
    pub fn new(
        title: &str,
        summary: String,
        link: String,
        effective_date: DateTime<Utc>,
        source: &str,
    ) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let summary = if summary.trim().is_empty() {
            title.to_string()
        } else {
            summary
        };

        Some(Self {
            title: title.to_string(),
            summary,
            link: link.trim().to_string(),
            published: effective_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            source: source.to_string(),
            image_url: None,
            raw_date: effective_date,
        })
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|u| !u.trim().is_empty());
        self
    }

    /// The effective date this article was filtered on.
    pub fn raw_date(&self) -> DateTime<Utc> {
        self.raw_date
    }
}

/// One feed to ingest, labelled with the display name of its topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub feed_url: String,
    pub source_label: String,
}

impl FetchTask {
    pub fn new(feed_url: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            source_label: source_label.into(),
        }
    }
}

/// A selectable topic: a display name plus the feeds that cover it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub feed_urls: Vec<String>,
}

/// The outcome of one ingestion run, as written to JSON.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run in `HH:MM:SS` format.
    pub local_time: String,
    /// Topic ids that were requested.
    pub topics: Vec<String>,
    pub article_count: usize,
    pub articles: Vec<Article>,
}

impl IngestReport {
    /// Report stamped with the current local date and time.
    pub fn new(topics: Vec<String>, articles: Vec<Article>) -> Self {
        Self::at(Local::now(), topics, articles)
    }

    pub fn at(now: DateTime<Local>, topics: Vec<String>, articles: Vec<Article>) -> Self {
        Self {
            local_date: now.format("%Y-%m-%d").to_string(),
            local_time: now.format("%H:%M:%S").to_string(),
            topics,
            article_count: articles.len(),
            articles,
        }
    }
}
