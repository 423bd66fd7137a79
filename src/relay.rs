//! Relay strategies for fetching documents through third-party proxies.
//!
//! Many feeds block or rate-limit direct requests, so each fetch walks an
//! ordered [`ProxyChain`]. A [`RelayStrategy`] knows two things only: how to
//! turn a target URL into a relay request, and how to pull the raw document
//! out of the relay's response body. Both are pure; the network call lives in
//! [`crate::fetcher`].
//!
//! | Strategy | Request | Response |
//! |----------|---------|----------|
//! | [`RelayStrategy::AllOrigins`] | `?url=<encoded>` | JSON envelope, text in `contents` |
//! | [`RelayStrategy::CodeTabs`] | `?quest=<encoded>` | passthrough |
//! | [`RelayStrategy::ThingProxy`] | target appended to path | passthrough |
//! | [`RelayStrategy::Direct`] | target as-is | passthrough |

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ALL_ORIGINS_ENDPOINT: &str = "https://api.allorigins.win/get";
pub const CODE_TABS_ENDPOINT: &str = "https://api.codetabs.com/v1/proxy";
pub const THING_PROXY_ENDPOINT: &str = "https://thingproxy.freeboard.io/fetch/";

/// A request to send to a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub url: String,
}

/// One way of reaching a target URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayStrategy {
    AllOrigins {
        #[serde(default = "default_all_origins")]
        endpoint: String,
    },
    CodeTabs {
        #[serde(default = "default_code_tabs")]
        endpoint: String,
    },
    ThingProxy {
        #[serde(default = "default_thing_proxy")]
        endpoint: String,
    },
    Direct,
}

fn default_all_origins() -> String {
    ALL_ORIGINS_ENDPOINT.to_string()
}

fn default_code_tabs() -> String {
    CODE_TABS_ENDPOINT.to_string()
}

fn default_thing_proxy() -> String {
    THING_PROXY_ENDPOINT.to_string()
}

/// Envelope returned by AllOrigins' `/get` endpoint.
#[derive(Debug, Deserialize)]
struct AllOriginsEnvelope {
    contents: Option<String>,
}

impl RelayStrategy {
    pub fn all_origins() -> Self {
        RelayStrategy::AllOrigins {
            endpoint: default_all_origins(),
        }
    }

    pub fn code_tabs() -> Self {
        RelayStrategy::CodeTabs {
            endpoint: default_code_tabs(),
        }
    }

    pub fn thing_proxy() -> Self {
        RelayStrategy::ThingProxy {
            endpoint: default_thing_proxy(),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            RelayStrategy::AllOrigins { .. } => "AllOrigins",
            RelayStrategy::CodeTabs { .. } => "CodeTabs",
            RelayStrategy::ThingProxy { .. } => "ThingProxy",
            RelayStrategy::Direct => "Direct",
        }
    }

    /// Build the relay request that fetches `target`.
    pub fn build_request(&self, target: &str) -> RelayRequest {
        let url = match self {
            RelayStrategy::AllOrigins { endpoint } => {
                format!("{}?url={}", endpoint, urlencoding::encode(target))
            }
            RelayStrategy::CodeTabs { endpoint } => {
                format!("{}?quest={}", endpoint, urlencoding::encode(target))
            }
            RelayStrategy::ThingProxy { endpoint } => format!("{}{}", endpoint, target),
            RelayStrategy::Direct => target.to_string(),
        };
        RelayRequest { url }
    }

    /// Extract the raw document from a successful relay response body.
    ///
    /// Returns `None` when the body does not carry any document, e.g. an
    /// AllOrigins envelope with empty or missing `contents`.
    pub fn extract_content(&self, body: &str) -> Option<String> {
        match self {
            RelayStrategy::AllOrigins { .. } => serde_json::from_str::<AllOriginsEnvelope>(body)
                .ok()
                .and_then(|envelope| envelope.contents)
                .filter(|contents| !contents.is_empty()),
            RelayStrategy::CodeTabs { .. }
            | RelayStrategy::ThingProxy { .. }
            | RelayStrategy::Direct => Some(body.to_string()),
        }
    }
}

impl fmt::Display for RelayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of relay strategies, tried first to last on every fetch.
///
/// The order is fixed for the lifetime of the chain; past successes do not
/// reorder it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyChain {
    strategies: Vec<RelayStrategy>,
}

impl ProxyChain {
    pub fn new(strategies: Vec<RelayStrategy>) -> Self {
        Self { strategies }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelayStrategy> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for ProxyChain {
    fn default() -> Self {
        Self::new(default_relays())
    }
}

/// AllOrigins first: it returns JSON and copes well with odd encodings.
pub fn default_relays() -> Vec<RelayStrategy> {
    vec![
        RelayStrategy::all_origins(),
        RelayStrategy::code_tabs(),
        RelayStrategy::thing_proxy(),
    ]
}
