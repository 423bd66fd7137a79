//! Command-line interface definitions for feed_ingest.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Global options can also be provided via environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for feed_ingest.
///
/// # Examples
///
/// ```sh
/// # Recent articles for two topics, printed as JSON
/// feed_ingest articles --topic tech --topic space
///
/// # Wider window, written to ./json/{date}/{time}.json
/// feed_ingest -j ./json articles -t world --window-hours 120
///
/// # Readable text of one page
/// feed_ingest page --url https://example.com/story
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, env = "FEED_INGEST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Write the report to this directory instead of stdout
    #[arg(short, long, env = "FEED_INGEST_JSON_DIR", global = true)]
    pub json_output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch recent, de-duplicated articles for the given topics
    Articles {
        /// Topic id to include (repeatable)
        #[arg(short, long = "topic", required = true)]
        topics: Vec<String>,

        /// Override the recency window, in hours
        #[arg(long)]
        window_hours: Option<i64>,

        /// Override the number of feeds fetched concurrently
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Print the readable text of a web page
    Page {
        #[arg(short, long)]
        url: String,
    },
    /// List the available topics
    Topics,
}
