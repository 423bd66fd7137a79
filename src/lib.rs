//! # feed_ingest
//!
//! Collects recent articles from many RSS/Atom feeds that are individually
//! unreliable, and returns one flat, de-duplicated list.
//!
//! ## Architecture
//!
//! Each run follows a fixed pipeline:
//! 1. **Expansion**: topic ids become `(feed URL, source label)` tasks ([`registry`])
//! 2. **Scheduling**: tasks run in throttled batches ([`scheduler`])
//! 3. **Fetching**: each feed goes through an ordered relay chain ([`relay`], [`fetcher`])
//! 4. **Parsing**: RSS/Atom documents become articles ([`parser`]), with a
//!    conversion service as safety net ([`conversion`])
//! 5. **Filtering**: stale items are dropped per feed ([`recency`])
//! 6. **Aggregation**: results are flattened and de-duplicated by title ([`aggregator`])
//!
//! [`pipeline::IngestPipeline`] ties the stages together.

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod conversion;
pub mod errors;
pub mod fetcher;
pub mod http;
pub mod models;
pub mod outputs;
pub mod page;
pub mod parser;
pub mod pipeline;
pub mod recency;
pub mod registry;
pub mod relay;
pub mod scheduler;
pub mod utils;

#[cfg(test)]
mod testing;
