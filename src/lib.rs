//! # tabcmp
//!
//! Comparison and classification of tables from clinical-trial reports.
//!
//! ## Features
//!
//! - **Dense-grid model**: merged cells resolve to index references to their anchor
//! - **Label alignment**: order-preserving matching of columns and rows
//! - **Structural verdict**: header depth, grouping, inserted and deleted rows/columns
//! - **Tolerant content diff**: numeric tokens compared under absolute/relative tolerance
//! - **Classification**: a six-category taxonomy or a binary match profile
//! - **Extraction**: RTF tables (merges, header rows, styles) and CSV/TSV references
//! - **Batch**: compare every file pair listed in a CSV
//!
//! ## Usage Examples
//!
//! ### Comparing two tables
//!
//! ```rust
//! use tabcmp::{compare, Category, CompareConfig, TableBuilder};
//!
//! let reference = TableBuilder::new()
//!     .header_row(["Variable", "Placebo"])
//!     .body_row(["Age", "65.3 (10.2)"])
//!     .build()
//!     .unwrap();
//! let regenerated = TableBuilder::new()
//!     .header_row(["Variable", "Placebo"])
//!     .body_row(["Age", "65.4 (10.2)"])
//!     .build()
//!     .unwrap();
//!
//! let config = CompareConfig::new().with_absolute_tolerance(0.1);
//! let result = compare(&[reference], &[regenerated], &config).unwrap();
//! assert_eq!(result.category, Category::DataDiffWithinTolerance);
//! ```
//!
//! ### Extracting RTF tables
//!
//! ```rust
//! use tabcmp::{Extractor, RtfExtractor};
//!
//! let rtf = r"{\rtf1\trowd\cellx1000\cellx2000
//! \pard\intbl Variable\cell\pard\intbl Placebo\cell\row}";
//! let tables = RtfExtractor.extract(rtf).unwrap();
//! assert_eq!(tables[0].column_count(), 2);
//! ```

/// Core comparison modules
pub mod core;

/// Feature modules - extraction and batch processing
pub mod features;

/// Utility modules
pub mod utils;

// Re-export core comparison types and functions
pub use core::{
    align, classify, compare, compare_table, diff, evaluate, normalize, AlignOp, AlignedPair,
    Alignment, Category, Cell, CellDiff, CellId, CellSpec, CellStyle, Classification,
    ComparisonResult, ContentKind, ContentVerdict, DataSeverity, DiffCause, HAlign,
    NormalizedCell, RowSpec, StructuralSeverity, StructuralVerdict, Table, TableBuilder,
    TableComparison,
};

// Re-export feature modules
pub use features::{extract_path, Extractor, RtfExtractor};

#[cfg(feature = "batch")]
pub use features::{
    compare_files, load_config, read_config, run_batch, BatchError, BatchRecord,
    DelimitedExtractor,
};

// Re-export utilities
pub use utils::config::{CompareConfig, OutputProfile};
pub use utils::error::{TableError, TableResult};
