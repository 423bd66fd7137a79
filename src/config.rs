//! Pipeline configuration.
//!
//! All tunables of an ingestion run live in [`PipelineConfig`], passed into
//! the pipeline's entry point. Every field has a documented default, so an
//! empty YAML file (or no file at all) yields a working configuration.
//!
//! # Example
//!
//! ```yaml
//! pipeline:
//!   batch_size: 3
//!   inter_batch_delay_ms: 1000
//!   recency_window_hours: 120
//!   relays:
//!     - kind: code_tabs
//!     - kind: all_origins
//! topics:
//!   - id: space
//!     name: Space & Aviation
//!     category: Science
//!     feed_urls:
//!       - https://www.space.com/feeds/all
//! ```

use crate::errors::{IngestError, IngestResult};
use crate::models::Topic;
use crate::registry::TopicRegistry;
use crate::relay::{default_relays, ProxyChain, RelayStrategy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_CONVERSION_ENDPOINT: &str = "https://api.rss2json.com/v1/api.json";

/// Tunables for one ingestion run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Feeds fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches, in milliseconds.
    pub inter_batch_delay_ms: u64,
    /// Upper bound on each relay or conversion attempt, in seconds.
    pub attempt_timeout_secs: u64,
    /// Maximum article age, in hours.
    pub recency_window_hours: i64,
    /// Summary length cap, in characters.
    pub summary_max_chars: usize,
    /// Items kept from a feed whose every item falls outside the window.
    pub fallback_head_size: usize,
    /// Normalized titles shorter than this are dropped during de-duplication.
    pub min_title_key_len: usize,
    /// Relay responses of this many bytes or fewer count as a miss.
    pub min_content_len: usize,
    /// Relay strategies in priority order.
    pub relays: Vec<RelayStrategy>,
    /// rss2json-compatible conversion endpoint.
    pub conversion_endpoint: String,
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            inter_batch_delay_ms: 500,
            attempt_timeout_secs: 15,
            recency_window_hours: 72,
            summary_max_chars: 500,
            fallback_head_size: 5,
            min_title_key_len: 3,
            min_content_len: 50,
            relays: default_relays(),
            conversion_endpoint: DEFAULT_CONVERSION_ENDPOINT.to_string(),
            user_agent: concat!("feed_ingest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.recency_window_hours)
    }

    pub fn proxy_chain(&self) -> ProxyChain {
        ProxyChain::new(self.relays.clone())
    }

    /// Reject values that would stall or empty every run.
    pub fn validate(&self) -> IngestResult<()> {
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be at least 1".into()));
        }
        if self.attempt_timeout_secs == 0 {
            return Err(IngestError::Config(
                "attempt_timeout_secs must be at least 1".into(),
            ));
        }
        if self.recency_window_hours <= 0 {
            return Err(IngestError::Config(
                "recency_window_hours must be positive".into(),
            ));
        }
        if self.summary_max_chars == 0 {
            return Err(IngestError::Config(
                "summary_max_chars must be at least 1".into(),
            ));
        }
        if self.relays.is_empty() {
            return Err(IngestError::Config("at least one relay is required".into()));
        }
        Ok(())
    }
}

/// Contents of the YAML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    /// Overrides the built-in topic registry when non-empty.
    pub topics: Vec<Topic>,
}

impl AppConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml(yaml: &str) -> IngestResult<Self> {
        let config: AppConfig = if yaml.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info", skip_all)]
    pub async fn load(path: Option<&Path>) -> IngestResult<Self> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(AppConfig::default());
        };

        let yaml = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(
            path = %path.display(),
            topics = config.topics.len(),
            relays = config.pipeline.relays.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn registry(&self) -> TopicRegistry {
        if self.topics.is_empty() {
            TopicRegistry::builtin()
        } else {
            TopicRegistry::new(self.topics.clone())
        }
    }
}
