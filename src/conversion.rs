//! Fallback through an rss2json-compatible conversion service.
//!
//! Used only when the relay chain and the parser together produced nothing
//! for a feed. The service fetches and parses the feed itself and answers
//! with JSON items, which are mapped straight into [`Article`]s after the
//! same cleanup the parser applies.

use crate::config::PipelineConfig;
use crate::http::HttpClient;
use crate::models::Article;
use crate::parser::{dates, html};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct ConversionEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    /// Kept raw so one malformed item cannot sink the others.
    #[serde(default)]
    items: Option<Vec<serde_json::Value>>,
}

/// One service item. The service sends `null` for absent strings as often
/// as it omits the key, so every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConversionItem {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    thumbnail: Option<String>,
    /// An object when present, but the service sends `[]` when absent.
    enclosure: serde_json::Value,
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ConversionItem {
    fn into_article(self, source: &str, summary_max_chars: usize, fetched_at: DateTime<Utc>) -> Option<Article> {
        let title = html::strip_markup(self.title.as_deref().unwrap_or_default());
        let body = non_blank(&self.description)
            .or(self.content.as_deref())
            .unwrap_or_default();
        let summary = html::clean_summary(body, summary_max_chars);
        let date = self
            .pub_date
            .as_deref()
            .and_then(dates::parse_lenient)
            .unwrap_or(fetched_at);

        let image = non_blank(&self.thumbnail).map(str::to_string).or_else(|| {
            self.enclosure
                .get("link")
                .and_then(|l| l.as_str())
                .map(|l| l.trim().to_string())
        });

        let link = self.link.unwrap_or_default();
        Article::new(&title, summary, link, date, source).map(|a| a.with_image(image))
    }
}

#[derive(Debug, Clone)]
pub struct ConversionFallback<C> {
    client: C,
    endpoint: String,
    attempt_timeout: Duration,
    summary_max_chars: usize,
}

impl<C: HttpClient> ConversionFallback<C> {
    pub fn new(client: C, endpoint: impl Into<String>, attempt_timeout: Duration, summary_max_chars: usize) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            attempt_timeout,
            summary_max_chars,
        }
    }

    pub fn from_config(client: C, config: &PipelineConfig) -> Self {
        Self::new(
            client,
            config.conversion_endpoint.clone(),
            config.attempt_timeout(),
            config.summary_max_chars,
        )
    }

    /// The service request for `feed_url`.
    pub fn request_url(&self, feed_url: &str) -> String {
        format!("{}?rss_url={}", self.endpoint, urlencoding::encode(feed_url))
    }

    /// Ask the service for `feed_url`'s items; any failure yields an empty list.
    #[instrument(level = "info", skip_all, fields(url = %feed_url, %source))]
    pub async fn fetch_structured(&self, feed_url: &str, source: &str) -> Vec<Article> {
        let request = self.request_url(feed_url);
        let response = match tokio::time::timeout(self.attempt_timeout, self.client.get(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(error = %e, "Conversion request failed");
                return Vec::new();
            }
            Err(_) => {
                warn!(timeout = ?self.attempt_timeout, "Conversion request timed out");
                return Vec::new();
            }
        };

        if !response.is_success() {
            warn!(status = response.status, "Conversion service returned an error status");
            return Vec::new();
        }

        let envelope: ConversionEnvelope = match serde_json::from_str(&response.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Conversion response is not valid JSON");
                return Vec::new();
            }
        };

        let status = envelope.status.as_deref().unwrap_or_default();
        if status != "ok" {
            warn!(
                %status,
                message = envelope.message.as_deref().unwrap_or(""),
                "Conversion service declined the feed"
            );
            return Vec::new();
        }

        let fetched_at = Utc::now();
        let articles: Vec<Article> = envelope
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ConversionItem>(raw) {
                Ok(item) => Some(item),
                Err(e) => {
                    debug!(error = %e, "Skipping malformed conversion item");
                    None
                }
            })
            .filter_map(|item| item.into_article(source, self.summary_max_chars, fetched_at))
            .collect();
        info!(count = articles.len(), "Conversion service returned items");
        articles
    }
}
