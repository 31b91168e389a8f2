//! Comparison configuration
//!
//! Tolerances, structural thresholds and table-shape hints shared
//! read-only by every comparison of a batch.

use serde::{Deserialize, Serialize};

use super::error::{TableError, TableResult};

/// Which classifier output the result summary follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputProfile {
    /// Six-category taxonomy (identical … structure_diff_entirely)
    #[default]
    Taxonomy,
    /// Coarse match / no-match; numeric and style differences are ignored
    Binary,
}

impl OutputProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputProfile::Taxonomy => "taxonomy",
            OutputProfile::Binary => "binary",
        }
    }
}

/// Options for table comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    /// Absolute numeric tolerance
    /// Default: 0
    pub absolute_tolerance: f64,

    /// Relative numeric tolerance, scaled by the larger magnitude of a token pair
    /// Default: 0
    pub relative_tolerance: f64,

    /// Coverage ratio at or above which insertions/deletions are listed label by label
    /// Default: 0.8
    pub minor_structural_threshold: f64,

    /// Coverage ratio below which two tables are considered unrelated
    /// Default: 0.3
    pub related_structural_threshold: f64,

    /// Column holding the row labels
    /// Default: 0
    pub label_column_index: usize,

    /// Number of header rows; auto-detected per table when absent
    pub header_row_count: Option<usize>,

    /// Output profile of the classifier
    /// Default: taxonomy
    pub profile: OutputProfile,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: 0.0,
            relative_tolerance: 0.0,
            minor_structural_threshold: 0.8,
            related_structural_threshold: 0.3,
            label_column_index: 0,
            header_row_count: None,
            profile: OutputProfile::Taxonomy,
        }
    }
}

impl CompareConfig {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options for the coarse match / no-match profile
    pub fn binary() -> Self {
        Self {
            profile: OutputProfile::Binary,
            ..Self::default()
        }
    }

    pub fn with_absolute_tolerance(mut self, tolerance: f64) -> Self {
        self.absolute_tolerance = tolerance;
        self
    }

    pub fn with_relative_tolerance(mut self, tolerance: f64) -> Self {
        self.relative_tolerance = tolerance;
        self
    }

    pub fn with_header_rows(mut self, count: usize) -> Self {
        self.header_row_count = Some(count);
        self
    }

    pub fn with_label_column(mut self, index: usize) -> Self {
        self.label_column_index = index;
        self
    }

    pub fn with_profile(mut self, profile: OutputProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Check tolerances and thresholds before any comparison runs
    pub fn validate(&self) -> TableResult<()> {
        for (name, value) in [
            ("absolute_tolerance", self.absolute_tolerance),
            ("relative_tolerance", self.relative_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TableError::config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("minor_structural_threshold", self.minor_structural_threshold),
            (
                "related_structural_threshold",
                self.related_structural_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TableError::config(format!(
                    "{} must lie within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.related_structural_threshold > self.minor_structural_threshold {
            return Err(TableError::config(format!(
                "related_structural_threshold ({}) exceeds minor_structural_threshold ({})",
                self.related_structural_threshold, self.minor_structural_threshold
            )));
        }

        Ok(())
    }

}
