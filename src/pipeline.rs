//! The ingestion pipeline.
//!
//! One run expands the requested topics into fetch tasks, pushes every task
//! through the [`BatchScheduler`] and aggregates the per-feed results:
//!
//! ```text
//! topic ids ─▶ TopicRegistry::expand ─▶ BatchScheduler
//!                                          │ per feed:
//!                                          │   RawFetcher ─▶ FeedParser
//!                                          │     └─(nothing)─▶ ConversionFallback
//!                                          │   RecencyFilter
//!                                          ▼
//!                                     Deduplicator ─▶ Vec<Article>
//! ```
//!
//! Nothing inside a feed task can fail the run. The run itself fails only
//! when it ends with no articles at all.

use crate::aggregator::Deduplicator;
use crate::config::PipelineConfig;
use crate::conversion::ConversionFallback;
use crate::errors::{IngestError, IngestResult};
use crate::fetcher::RawFetcher;
use crate::http::HttpClient;
use crate::models::{Article, FetchTask};
use crate::page::{readable_text, PAGE_TEXT_MAX_CHARS};
use crate::parser::FeedParser;
use crate::recency::RecencyFilter;
use crate::registry::TopicRegistry;
use crate::scheduler::BatchScheduler;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

pub struct IngestPipeline<C> {
    fetcher: RawFetcher<C>,
    conversion: ConversionFallback<C>,
    parser: FeedParser,
    recency: RecencyFilter,
    scheduler: BatchScheduler,
    dedup: Deduplicator,
}

impl<C: HttpClient + Clone> IngestPipeline<C> {
    pub fn new(client: C, config: &PipelineConfig) -> Self {
        Self {
            fetcher: RawFetcher::from_config(client.clone(), config),
            conversion: ConversionFallback::from_config(client, config),
            parser: FeedParser::new(config.summary_max_chars),
            recency: RecencyFilter::new(config.recency_window(), config.fallback_head_size),
            scheduler: BatchScheduler::from_config(config),
            dedup: Deduplicator::new(config.min_title_key_len),
        }
    }

    /// Recent articles from every feed of `topic_ids`, de-duplicated.
    ///
    /// Returns [`IngestError::NoArticles`] when nothing was collected,
    /// including when `topic_ids` selects no feeds; in that case no request
    /// is made.
    #[instrument(level = "info", skip_all, fields(topics = ?topic_ids))]
    pub async fn fetch_articles_for_topics(
        &self,
        registry: &TopicRegistry,
        topic_ids: &[String],
    ) -> IngestResult<Vec<Article>> {
        let tasks = registry.expand(topic_ids);
        if tasks.is_empty() {
            warn!("No feeds selected");
            return Err(IngestError::NoArticles);
        }

        let t0 = Instant::now();
        let feeds = tasks.len();
        let articles = self.collect(tasks).await;
        info!(
            feeds,
            articles = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Ingestion run finished"
        );

        if articles.is_empty() {
            error!("Every feed failed or yielded nothing");
            return Err(IngestError::NoArticles);
        }
        Ok(articles)
    }

    /// Run every task through the scheduler and de-duplicate the results.
    pub async fn collect(&self, tasks: Vec<FetchTask>) -> Vec<Article> {
        let pipeline = self;
        let per_feed = self
            .scheduler
            .run(tasks, move |task: FetchTask| async move { pipeline.fetch_feed(&task).await })
            .await;
        self.dedup.aggregate(per_feed)
    }

    /// Recent articles of a single feed; empty when every source failed.
    #[instrument(level = "info", skip_all, fields(url = %task.feed_url, source = %task.source_label))]
    pub async fn fetch_feed(&self, task: &FetchTask) -> Vec<Article> {
        let parsed = match self.fetcher.fetch_text(&task.feed_url).await {
            Some(raw) => self
                .parser
                .parse_with_base(&raw, &task.source_label, &task.feed_url),
            None => Vec::new(),
        };

        let candidates = if parsed.is_empty() {
            info!("No items from relays; asking the conversion service");
            self.conversion
                .fetch_structured(&task.feed_url, &task.source_label)
                .await
        } else {
            parsed
        };

        let candidates_len = candidates.len();
        let kept = self.recency.filter(candidates);
        info!(candidates = candidates_len, kept = kept.len(), "Feed processed");
        kept
    }

    /// Readable text of the page at `url`, or `None` when it cannot be
    /// fetched or has no text.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_page_text(&self, url: &str) -> Option<String> {
        let html = self.fetcher.fetch_page(url).await?;
        let text = readable_text(&html, PAGE_TEXT_MAX_CHARS);
        if text.is_empty() {
            warn!("Page has no readable text");
            return None;
        }
        info!(chars = text.chars().count(), "Extracted page text");
        Some(text)
    }
}
