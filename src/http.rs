//! HTTP transport used by the relay chain and the conversion fallback.
//!
//! [`HttpClient`] is the seam between the pipeline and the network: the
//! pipeline only ever issues plain GETs and reads the whole body as text.
//! [`ReqwestClient`] is the production implementation. Timeouts are not the
//! client's concern; callers wrap each call in [`tokio::time::timeout`].

use crate::errors::IngestResult;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Status and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: String,
}

impl RelayResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal async GET client.
pub trait HttpClient {
    /// Fetch `url` and return its status and body text.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// transport failures are errors.
    async fn get(&self, url: &str) -> IngestResult<RelayResponse>;
}

/// [`HttpClient`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(user_agent: &str) -> IngestResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .pool_idle_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured `reqwest::Client`.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestClient {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str) -> IngestResult<RelayResponse> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET completed"
        );
        Ok(RelayResponse { status, body })
    }
}
