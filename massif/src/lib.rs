//! Massif profile tools.
//!
//! This crate builds on [`massif_parse`] with the pieces a report or
//! dashboard needs around the parsed document.
//!
//! # Modules
//!
//! - [`datasize`] - Byte counts with binary and decimal magnitude units
//! - [`export`] - JSON export of documents and run summaries
//! - [`growth`] - Memory growth between consecutive snapshots
//! - [`input`] - Opening plain, gzip and zstd compressed Massif files
//!
//! # Example
//!
//! ```no_run
//! use massif::export::Summary;
//! use std::path::Path;
//!
//! let profile = massif::load(Path::new("massif.out.1234.gz")).unwrap();
//! let summary = Summary::compute(&profile);
//! println!("{} snapshots", summary.snapshot_count);
//! ```

pub mod datasize;
pub mod export;
pub mod growth;
pub mod input;

// Re-export massif_parse for convenience
pub use massif_parse;

use log::info;
use massif_parse::Massif;
use std::path::Path;
use thiserror::Error;

/// Errors produced by the Massif tools.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] massif_parse::ParseError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Open and parse a Massif file, decompressing it if the extension says so.
pub fn load(path: &Path) -> Result<Massif> {
    let reader = input::open_input(path)?;
    let massif = Massif::parse_buffered(reader)?;
    info!(
        "loaded {} snapshots from {}",
        massif.snapshots.len(),
        path.display()
    );
    Ok(massif)
}
