//! # feed_ingest
//!
//! Command-line driver for the feed ingestion pipeline.
//!
//! ## Usage
//!
//! ```sh
//! feed_ingest articles --topic tech --topic space
//! feed_ingest -j ./json articles -t world --window-hours 120
//! feed_ingest page --url https://example.com/story
//! feed_ingest topics
//! ```

use clap::Parser;
use feed_ingest::cli::{Cli, Command};
use feed_ingest::config::AppConfig;
use feed_ingest::errors::IngestError;
use feed_ingest::http::ReqwestClient;
use feed_ingest::models::IngestReport;
use feed_ingest::outputs::json;
use feed_ingest::pipeline::IngestPipeline;
use feed_ingest::utils::ensure_writable_dir;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_ingest starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.json_output_dir, ?args.command, "Parsed CLI arguments");

    let mut config = AppConfig::load(args.config.as_deref()).await?;
    let registry = config.registry();

    match args.command {
        Command::Topics => {
            for topic in registry.topics() {
                println!(
                    "{:<14} {:<28} {:<16} {} feeds",
                    topic.id,
                    topic.name,
                    topic.category,
                    topic.feed_urls.len()
                );
            }
        }
        Command::Page { url } => {
            let client = ReqwestClient::new(&config.pipeline.user_agent)?;
            let pipeline = IngestPipeline::new(client, &config.pipeline);
            match pipeline.fetch_page_text(&url).await {
                Some(text) => println!("{}", text),
                None => {
                    error!(%url, "Could not retrieve readable text");
                    return Err(format!("could not retrieve {}", url).into());
                }
            }
        }
        Command::Articles {
            topics,
            window_hours,
            batch_size,
        } => {
            if let Some(hours) = window_hours {
                config.pipeline.recency_window_hours = hours;
            }
            if let Some(size) = batch_size {
                config.pipeline.batch_size = size;
            }
            config.pipeline.validate()?;

            // Early check: ensure JSON output dir is writable
            if let Some(dir) = &args.json_output_dir {
                if let Err(e) = ensure_writable_dir(dir).await {
                    error!(
                        path = %dir.display(),
                        error = %e,
                        "JSON output directory is not writable (fix perms or choose a different path)"
                    );
                    return Err(e.into());
                }
            }

            let client = ReqwestClient::new(&config.pipeline.user_agent)?;
            let pipeline = IngestPipeline::new(client, &config.pipeline);

            let articles = match pipeline.fetch_articles_for_topics(&registry, &topics).await {
                Ok(articles) => articles,
                Err(IngestError::NoArticles) => {
                    error!(topics = ?topics, "could not download any articles");
                    return Err(IngestError::NoArticles.into());
                }
                Err(e) => return Err(e.into()),
            };

            let report = IngestReport::new(topics, articles);
            match &args.json_output_dir {
                Some(dir) => {
                    let path = json::write_report(&report, dir).await?;
                    info!(path = %path.display(), "Report written");
                }
                None => println!("{}", json::render_report(&report)?),
            }
        }
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "feed_ingest finished"
    );
    Ok(())
}
