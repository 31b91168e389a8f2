//! Feature modules - Document extraction and batch processing
//!
//! This module contains the front ends around the comparison engine:
//! - RTF table extraction (rows, merges, styles, header flags)
//! - Delimited-text extraction for reference tables kept as CSV/TSV
//! - Batch comparison of file pairs listed in a CSV

#[cfg(feature = "batch")]
pub mod batch;
#[cfg(feature = "batch")]
pub mod delimited;
pub mod rtf;

use std::path::Path;

use crate::core::table::Table;
use crate::utils::error::{TableError, TableResult};

// Re-export commonly used types
#[cfg(feature = "batch")]
pub use batch::{
    compare_files, load_config, read_config, run_batch, BatchError, BatchRecord,
};
#[cfg(feature = "batch")]
pub use delimited::DelimitedExtractor;
pub use rtf::RtfExtractor;

/// Turns a raw document into its tables, in document order
pub trait Extractor {
    fn extract(&self, raw: &str) -> TableResult<Vec<Table>>;
}

/// Read a file and extract its tables, choosing the extractor by extension
pub fn extract_path(path: impl AsRef<Path>) -> TableResult<Vec<Table>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let bytes = std::fs::read(path)?;
    let raw = String::from_utf8_lossy(&bytes);
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "extracting tables");

    match extension.as_str() {
        "rtf" => RtfExtractor.extract(&raw),
        #[cfg(feature = "batch")]
        "csv" => DelimitedExtractor::csv().extract(&raw),
        #[cfg(feature = "batch")]
        "tsv" => DelimitedExtractor::tsv().extract(&raw),
        other => Err(TableError::parse(format!(
            "unsupported file extension '{}' for {}",
            other,
            path.display()
        ))),
    }
}
