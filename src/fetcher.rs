//! Raw document retrieval through the relay chain.
//!
//! [`RawFetcher`] walks its [`ProxyChain`] in order and returns the first
//! plausible document. Every miss (timeout, transport error, non-success
//! status, empty envelope, implausible body) is logged and swallowed; the
//! only outcome a caller sees is `Some(text)` or `None`.

use crate::config::PipelineConfig;
use crate::errors::IngestError;
use crate::http::HttpClient;
use crate::relay::{ProxyChain, RelayStrategy};
use crate::utils::truncate_for_log;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Root markers that identify an RSS, Atom or RDF document.
const FEED_MARKERS: &[&str] = &["<rss", "<feed", "<rdf", "<?xml"];

/// What the caller expects to get back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// An RSS/Atom document: must be long enough and carry a root marker.
    Feed,
    /// An arbitrary web page: must only be long enough.
    Page,
}

/// Why one relay attempt did not produce a document.
#[derive(Debug, Error)]
enum AttemptMiss {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(#[from] IngestError),
    #[error("relay answered with status {0}")]
    Status(u16),
    #[error("relay response carried no document")]
    Empty,
    #[error("implausible document ({0} bytes)")]
    Implausible(usize),
}

#[derive(Debug, Clone)]
pub struct RawFetcher<C> {
    client: C,
    chain: ProxyChain,
    attempt_timeout: Duration,
    min_content_len: usize,
}

impl<C: HttpClient> RawFetcher<C> {
    pub fn new(client: C, chain: ProxyChain, attempt_timeout: Duration, min_content_len: usize) -> Self {
        Self {
            client,
            chain,
            attempt_timeout,
            min_content_len,
        }
    }

    pub fn from_config(client: C, config: &PipelineConfig) -> Self {
        Self::new(
            client,
            config.proxy_chain(),
            config.attempt_timeout(),
            config.min_content_len,
        )
    }

    /// Fetch a feed document, or `None` when every relay missed.
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        self.fetch(url, FetchMode::Feed).await
    }

    /// Fetch an arbitrary page, or `None` when every relay missed.
    pub async fn fetch_page(&self, url: &str) -> Option<String> {
        self.fetch(url, FetchMode::Page).await
    }

    #[instrument(level = "info", skip_all, fields(%url, ?mode))]
    async fn fetch(&self, url: &str, mode: FetchMode) -> Option<String> {
        for strategy in self.chain.iter() {
            match self.attempt(strategy, url, mode).await {
                Ok(text) => {
                    info!(relay = %strategy, bytes = text.len(), "Relay returned document");
                    return Some(text);
                }
                Err(miss) => warn!(relay = %strategy, reason = %miss, "Relay attempt missed"),
            }
        }
        warn!(relays = self.chain.len(), "Every relay missed");
        None
    }

    async fn attempt(
        &self,
        strategy: &RelayStrategy,
        url: &str,
        mode: FetchMode,
    ) -> Result<String, AttemptMiss> {
        let request = strategy.build_request(url);
        debug!(relay = %strategy, request = %request.url, "Relay attempt");

        let response = tokio::time::timeout(self.attempt_timeout, self.client.get(&request.url))
            .await
            .map_err(|_| AttemptMiss::Timeout(self.attempt_timeout))??;

        if !response.is_success() {
            return Err(AttemptMiss::Status(response.status));
        }

        let text = strategy
            .extract_content(&response.body)
            .ok_or(AttemptMiss::Empty)?;
        debug!(preview = %truncate_for_log(&text, 160), "Relay body");

        let plausible = match mode {
            FetchMode::Feed => is_plausible_feed(&text, self.min_content_len),
            FetchMode::Page => is_plausible_page(&text, self.min_content_len),
        };
        if plausible {
            Ok(text)
        } else {
            Err(AttemptMiss::Implausible(text.len()))
        }
    }
}

/// Longer than `min_len` bytes and carrying a feed root marker.
pub fn is_plausible_feed(text: &str, min_len: usize) -> bool {
    if text.len() <= min_len {
        return false;
    }
    let lower = text.to_ascii_lowercase();
    FEED_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Longer than `min_len` bytes.
pub fn is_plausible_page(text: &str, min_len: usize) -> bool {
    text.len() > min_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RelayResponse;
    use crate::testing::{all_origins_envelope, rss_with_items, FakeClient, Reply};

    const FEED: &str = "https://example.com/feed.xml";
    const ALL_ORIGINS: &str = "https://api.allorigins.win/";
    const CODE_TABS: &str = "https://api.codetabs.com/";
    const THING_PROXY: &str = "https://thingproxy.freeboard.io/";

    fn fetcher(client: FakeClient) -> RawFetcher<FakeClient> {
        RawFetcher::new(client, ProxyChain::default(), Duration::from_secs(15), 50)
    }

    fn feed() -> String {
        rss_with_items(&[("Headline", "Sun, 01 Jun 2025 10:00:00 GMT")])
    }

    #[tokio::test]
    async fn test_first_relay_wins() {
        let client = FakeClient::new()
            .route(ALL_ORIGINS, Reply::ok(all_origins_envelope(&feed())))
            .route(CODE_TABS, Reply::ok(feed()));
        let fetcher = fetcher(client.clone());

        assert_eq!(fetcher.fetch_text(FEED).await, Some(feed()));
        assert_eq!(client.calls().len(), 1);
        assert!(client.calls()[0].starts_with(ALL_ORIGINS));
    }

    #[tokio::test]
    async fn test_falls_through_on_status_and_transport_errors() {
        let client = FakeClient::new()
            .route(ALL_ORIGINS, Reply::status(503))
            .route(CODE_TABS, Reply::Fail("connection reset".into()))
            .route(THING_PROXY, Reply::ok(feed()));
        let fetcher = fetcher(client.clone());

        assert_eq!(fetcher.fetch_text(FEED).await, Some(feed()));
        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with(ALL_ORIGINS));
        assert!(calls[1].starts_with(CODE_TABS));
        assert_eq!(calls[2], format!("{}fetch/{}", THING_PROXY, FEED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_next_relay() {
        let client = FakeClient::new()
            .route(ALL_ORIGINS, Reply::Hang)
            .route(CODE_TABS, Reply::ok(feed()));
        let fetcher = fetcher(client.clone());

        let started = tokio::time::Instant::now();
        assert_eq!(fetcher.fetch_text(FEED).await, Some(feed()));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16));
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_implausible_content_is_a_miss() {
        let html_page = format!("<html><body>{}</body></html>", "blocked ".repeat(20));
        let client = FakeClient::new()
            .route(ALL_ORIGINS, Reply::ok(all_origins_envelope("<rss/>")))
            .route(CODE_TABS, Reply::ok(html_page))
            .route(THING_PROXY, Reply::ok(feed()));
        let fetcher = fetcher(client.clone());

        assert_eq!(fetcher.fetch_text(FEED).await, Some(feed()));
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_envelope_is_a_miss() {
        let client = FakeClient::new()
            .route(ALL_ORIGINS, Reply::ok(r#"{"contents":null}"#))
            .route(CODE_TABS, Reply::ok(feed()));
        assert_eq!(fetcher(client).fetch_text(FEED).await, Some(feed()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_relays_missing_is_none() {
        let client = FakeClient::new()
            .route(ALL_ORIGINS, Reply::Delayed(Duration::from_secs(20), RelayResponse::ok(feed())))
            .route(CODE_TABS, Reply::status(429))
            .route(THING_PROXY, Reply::Fail("dns".into()));
        let fetcher = fetcher(client.clone());

        assert_eq!(fetcher.fetch_text(FEED).await, None);
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_page_mode_accepts_html() {
        let page = format!("<html><body><p>{}</p></body></html>", "text ".repeat(20));
        let client = FakeClient::new().route(ALL_ORIGINS, Reply::ok(all_origins_envelope(&page)));
        assert_eq!(fetcher(client.clone()).fetch_page(FEED).await, Some(page.clone()));
        assert_eq!(fetcher(client).fetch_text(FEED).await, None);
    }

    #[tokio::test]
    async fn test_chain_order_follows_configuration() {
        let client = FakeClient::new()
            .route(FEED, Reply::ok(feed()))
            .route(CODE_TABS, Reply::ok(feed()));
        let chain = ProxyChain::new(vec![RelayStrategy::Direct, RelayStrategy::code_tabs()]);
        let fetcher = RawFetcher::new(client.clone(), chain, Duration::from_secs(15), 50);

        assert!(fetcher.fetch_text(FEED).await.is_some());
        assert_eq!(client.calls(), vec![FEED.to_string()]);
    }

    #[test]
    fn test_feed_plausibility() {
        let padding = " ".repeat(60);
        assert!(is_plausible_feed(&format!("<?xml version=\"1.0\"?>{}", padding), 50));
        assert!(is_plausible_feed(&format!("{}<RSS version=\"2.0\">", padding), 50));
        assert!(is_plausible_feed(&format!("<feed xmlns=\"x\">{}", padding), 50));
        assert!(!is_plausible_feed("<rss></rss>", 50));
        assert!(!is_plausible_feed(&format!("<html>{}</html>", padding), 50));
    }

    #[test]
    fn test_page_plausibility() {
        assert!(is_plausible_page(&"x".repeat(51), 50));
        assert!(!is_plausible_page(&"x".repeat(50), 50));
    }
}
