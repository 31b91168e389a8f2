//! Error handling for table extraction and comparison
//!
//! This module provides a unified error type and result type for all
//! table construction, extraction and comparison operations.

use thiserror::Error;

/// Table error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Dense-grid reconstruction is impossible for a table
    #[error("{}", format_malformed(.message, .row, .column))]
    MalformedTable {
        message: String,
        row: Option<usize>,
        column: Option<usize>,
    },
    /// A tolerance or threshold is out of range
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    /// Source document could not be parsed into rows and cells
    #[error("Parse error: {0}")]
    Parse(String),
    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(String),
}

fn format_malformed(message: &str, row: &Option<usize>, column: &Option<usize>) -> String {
    match (*row, *column) {
        (Some(r), Some(c)) => format!("Malformed table at row {}, column {}: {}", r, c, message),
        (Some(r), None) => format!("Malformed table at row {}: {}", r, message),
        _ => format!("Malformed table: {}", message),
    }
}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        TableError::Io(err.to_string())
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

// Convenience constructors for errors
impl TableError {
    pub fn malformed(message: impl Into<String>) -> Self {
        TableError::MalformedTable {
            message: message.into(),
            row: None,
            column: None,
        }
    }

    pub fn malformed_at_row(message: impl Into<String>, row: usize) -> Self {
        TableError::MalformedTable {
            message: message.into(),
            row: Some(row),
            column: None,
        }
    }

    pub fn malformed_at(message: impl Into<String>, row: usize, column: usize) -> Self {
        TableError::MalformedTable {
            message: message.into(),
            row: Some(row),
            column: Some(column),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        TableError::Configuration(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        TableError::Parse(message.into())
    }

    /// Whether the error concerns the shape of an input table
    pub fn is_malformed(&self) -> bool {
        matches!(self, TableError::MalformedTable { .. })
    }
}
