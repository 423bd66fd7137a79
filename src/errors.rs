//! Error types for the ingestion pipeline.
//!
//! Almost every failure inside the pipeline is recovered locally and turned
//! into an empty or absent value. [`IngestError`] is what remains: failures at
//! the edges (configuration, client construction, output) plus the single
//! fatal run outcome, [`IngestError::NoArticles`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Every feed of every requested topic failed or yielded nothing.
    #[error("could not download any articles")]
    NoArticles,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest [`crate::http::HttpClient`].
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed XML document: {0}")]
    Xml(String),
}

impl From<quick_xml::Error> for IngestError {
    fn from(err: quick_xml::Error) -> Self {
        IngestError::Xml(err.to_string())
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
