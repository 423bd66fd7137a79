//! Scripted in-memory [`HttpClient`] for unit tests.

use crate::errors::{IngestError, IngestResult};
use crate::http::{HttpClient, RelayResponse};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Respond(RelayResponse),
    Fail(String),
    /// Respond after a delay (virtual time under `start_paused`).
    Delayed(Duration, RelayResponse),
    /// Never respond.
    Hang,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Respond(RelayResponse::ok(body))
    }

    pub fn status(status: u16) -> Self {
        Reply::Respond(RelayResponse {
            status,
            body: String::new(),
        })
    }
}

#[derive(Debug, Default)]
struct State {
    routes: Vec<(String, Reply)>,
    calls: Vec<String>,
}

/// Replies with the first route whose prefix matches the requested URL and
/// records every URL it was asked for.
#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    state: Arc<Mutex<State>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, prefix: impl Into<String>, reply: Reply) -> Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .push((prefix.into(), reply));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }
}

impl HttpClient for FakeClient {
    async fn get(&self, url: &str) -> IngestResult<RelayResponse> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(url.to_string());
            state
                .routes
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, reply)| reply.clone())
        };

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(reason)) => Err(IngestError::Transport(reason)),
            Some(Reply::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(IngestError::Transport(format!("no route for {}", url))),
        }
    }
}

/// An RSS 2.0 document with one `<item>` per `(title, pub_date)` pair.
pub fn rss_with_items(items: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel><title>Test feed</title>",
    );
    for (i, (title, pub_date)) in items.iter().enumerate() {
        xml.push_str(&format!(
            "<item><title>{}</title><link>https://example.com/{}</link><description>Summary of item {}.</description><pubDate>{}</pubDate></item>",
            title, i, i, pub_date
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

/// AllOrigins envelope around `contents`.
pub fn all_origins_envelope(contents: &str) -> String {
    serde_json::json!({ "contents": contents }).to_string()
}
