//! Output generation for ingestion reports.
//!
//! # Submodules
//!
//! - [`json`]: Serializes an [`IngestReport`](crate::models::IngestReport) to
//!   stdout or to a dated JSON file

pub mod json;
