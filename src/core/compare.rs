//! Comparison driver
//!
//! Runs the pipeline for each table pair and merges the per-table results:
//!
//! ```text
//! (Table, Table) -> AlignedPair -> { evaluate, diff } -> classify
//! ```

use serde::Serialize;

use super::align::AlignedPair;
use super::classify::{classify, Category, Classification};
use super::content::{diff, CellDiff, ContentVerdict, DataSeverity};
use super::structure::{evaluate, StructuralSeverity, StructuralVerdict};
use super::table::Table;
use crate::utils::config::{CompareConfig, OutputProfile};
use crate::utils::error::{TableError, TableResult};

/// Result of comparing one pair of tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableComparison {
    /// Position of the pair in both documents
    pub index: usize,
    pub category: Category,
    pub matches: bool,
    pub summary: String,
    pub structural: StructuralVerdict,
    pub content: ContentVerdict,
}

/// Outcome of comparing two documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub category: Category,
    pub structural_severity: StructuralSeverity,
    pub data_severity: DataSeverity,
    pub style_differs: bool,
    /// Binary match flag, populated under every profile
    pub matches: bool,
    pub summary: String,
    /// Every differing cell across all table pairs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<CellDiff>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableComparison>,
    /// Diagnostic for input that could not be compared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonResult {
    /// Non-matching outcome for a pair that could not be read or built
    pub fn malformed(error: &TableError) -> Self {
        let message = error.to_string();
        ComparisonResult {
            category: Category::StructureDiffEntirely,
            structural_severity: StructuralSeverity::Total,
            data_severity: DataSeverity::None,
            style_differs: false,
            matches: false,
            summary: message.clone(),
            diffs: Vec::new(),
            tables: Vec::new(),
            error: Some(message),
        }
    }

    pub fn is_identical(&self) -> bool {
        self.category == Category::Identical && self.error.is_none()
    }

    /// Whether the structures agree well enough to compare values
    pub fn structure_match(&self) -> bool {
        self.category.structure_match()
    }
}

/// Compare one pair of tables
///
/// The configuration is not validated here; [`compare`] does that once
/// for the whole document.
pub fn compare_table(
    index: usize,
    left: &Table,
    right: &Table,
    config: &CompareConfig,
) -> TableComparison {
    let pair = AlignedPair::new(left, right, config);
    let structural = evaluate(&pair, config);

    // Cell values are meaningless once the shapes are unrelated
    let content = if structural.severity == StructuralSeverity::Total {
        ContentVerdict::default()
    } else {
        diff(&pair, config)
    };

    let Classification {
        category,
        matches,
        summary,
    } = classify(&structural, &content, config.profile);

    tracing::debug!(
        index,
        category = category.as_str(),
        structural = structural.severity.as_str(),
        data = content.data_severity.as_str(),
        "compared table pair"
    );

    TableComparison {
        index,
        category,
        matches,
        summary,
        structural,
        content,
    }
}

/// Compare two documents' tables, paired by position
pub fn compare(
    left: &[Table],
    right: &[Table],
    config: &CompareConfig,
) -> TableResult<ComparisonResult> {
    config.validate()?;

    if left.len() != right.len() {
        let structural = StructuralVerdict::table_count_mismatch(left.len(), right.len());
        let classification = classify(&structural, &ContentVerdict::default(), config.profile);
        tracing::debug!(
            left = left.len(),
            right = right.len(),
            "table count mismatch"
        );
        return Ok(ComparisonResult {
            category: classification.category,
            structural_severity: structural.severity,
            data_severity: DataSeverity::None,
            style_differs: false,
            matches: false,
            summary: classification.summary,
            diffs: Vec::new(),
            tables: Vec::new(),
            error: None,
        });
    }

    let tables: Vec<TableComparison> = left
        .iter()
        .zip(right)
        .enumerate()
        .map(|(index, (l, r))| compare_table(index, l, r, config))
        .collect();

    Ok(merge(tables, config.profile))
}

fn merge(tables: Vec<TableComparison>, profile: OutputProfile) -> ComparisonResult {
    let category = tables
        .iter()
        .map(|t| t.category)
        .max()
        .unwrap_or(Category::Identical);
    let matches = tables.iter().all(|t| t.matches);
    let multiple = tables.len() > 1;

    // The first table carrying the deciding outcome explains the result
    let deciding = match profile {
        OutputProfile::Taxonomy => tables.iter().find(|t| t.category == category),
        OutputProfile::Binary => tables.iter().find(|t| !t.matches),
    }
    .or(tables.first());
    let summary = match deciding {
        Some(t) if multiple => format!("table {}: {}", t.index, t.summary),
        Some(t) => t.summary.clone(),
        None => "no tables to compare".to_string(),
    };
    let summary = match profile {
        OutputProfile::Binary if matches && multiple => {
            format!("all tables match ({} table(s) compared)", tables.len())
        }
        OutputProfile::Taxonomy if category == Category::Identical && multiple => {
            format!("all tables identical ({} table(s) compared)", tables.len())
        }
        _ => summary,
    };

    ComparisonResult {
        category,
        structural_severity: tables
            .iter()
            .map(|t| t.structural.severity)
            .max()
            .unwrap_or_default(),
        data_severity: tables
            .iter()
            .map(|t| t.content.data_severity)
            .max()
            .unwrap_or_default(),
        style_differs: tables.iter().any(|t| t.content.style_differs),
        matches,
        summary,
        diffs: tables
            .iter()
            .flat_map(|t| t.content.diffs.iter().cloned())
            .collect(),
        tables,
        error: None,
    }
}
