//! Core comparison modules
//!
//! This module contains the comparison engine, leaves first:
//! - `table`: dense-grid table model
//! - `normalize`: cell text canonicalization and content kinds
//! - `align`: order-preserving label alignment
//! - `structure`: structural-distance verdict
//! - `content`: cell value and style diffing under tolerance
//! - `classify`: category taxonomy and output profiles
//! - `compare`: the comparison driver

pub mod align;
pub mod classify;
pub mod compare;
pub mod content;
pub mod normalize;
pub mod structure;
pub mod table;

// Re-export main types and functions
pub use align::{align, AlignOp, AlignedPair, Alignment};
pub use classify::{classify, Category, Classification};
pub use compare::{compare, compare_table, ComparisonResult, TableComparison};
pub use content::{diff, CellDiff, ContentVerdict, DataSeverity, DiffCause};
pub use normalize::{normalize, ContentKind, NormalizedCell};
pub use structure::{evaluate, StructuralSeverity, StructuralVerdict};
pub use table::{Cell, CellId, CellSpec, CellStyle, HAlign, RowSpec, Table, TableBuilder};
