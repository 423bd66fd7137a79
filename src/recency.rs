//! Recency filtering with a head-slice fallback.

use crate::models::Article;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RecencyFilter {
    window: Duration,
    fallback_head: usize,
}

impl RecencyFilter {
    pub fn new(window: Duration, fallback_head: usize) -> Self {
        Self {
            window,
            fallback_head,
        }
    }

    /// Keep the candidates published within the window ending now.
    pub fn filter(&self, candidates: Vec<Article>) -> Vec<Article> {
        self.filter_at(candidates, Utc::now())
    }

    /// Keep the candidates whose date is after `now - window`.
    ///
    /// A non-empty candidate list never filters down to nothing: when every
    /// candidate is stale, the first `fallback_head` candidates in document
    /// order are returned instead.
    pub fn filter_at(&self, candidates: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
        let cutoff = now - self.window;
        let total = candidates.len();

        let (recent, stale): (Vec<Article>, Vec<Article>) =
            candidates.into_iter().partition(|a| a.raw_date() > cutoff);

        if !recent.is_empty() || stale.is_empty() {
            debug!(kept = recent.len(), total, "Recency filter applied");
            return recent;
        }

        let head: Vec<Article> = stale.into_iter().take(self.fallback_head).collect();
        debug!(kept = head.len(), total, "Every candidate is stale; keeping the head of the feed");
        head
    }
}
