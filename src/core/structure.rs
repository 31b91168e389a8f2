//! Structural Evaluator
//!
//! Derives a structural-distance verdict from the two axis alignments and
//! a level-by-level comparison of the header block. Rules are checked in
//! order and the first one that fires sets the severity:
//!
//! 1. table count mismatch (checked by the comparison driver)
//! 2. coverage below the related threshold, or no matching column label
//! 3. header depth or header grouping differs
//! 4. rows or columns inserted or deleted (coverage under the minor
//!    threshold is additionally reported as a substantial restructuring)
//! 5. otherwise none, or minor when only vertical header merges differ

use serde::Serialize;

use super::align::{AlignedPair, Alignment};
use super::table::Table;
use crate::utils::config::CompareConfig;

/// How much two table shapes differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructuralSeverity {
    #[default]
    None,
    Minor,
    Major,
    Total,
}

impl StructuralSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralSeverity::None => "NONE",
            StructuralSeverity::Minor => "MINOR",
            StructuralSeverity::Major => "MAJOR",
            StructuralSeverity::Total => "TOTAL",
        }
    }
}

/// Structural verdict for one table pair
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StructuralVerdict {
    pub severity: StructuralSeverity,
    /// One entry per structural difference, most significant first
    pub reasons: Vec<String>,
    pub column_coverage: f64,
    pub row_coverage: f64,
}

impl StructuralVerdict {
    /// Verdict for two documents holding different numbers of tables
    pub fn table_count_mismatch(left: usize, right: usize) -> Self {
        StructuralVerdict {
            severity: StructuralSeverity::Total,
            reasons: vec![format!(
                "table count mismatch: left={}, right={}",
                left, right
            )],
            column_coverage: 0.0,
            row_coverage: 0.0,
        }
    }
}

/// Evaluate the structural distance between two aligned tables
pub fn evaluate(pair: &AlignedPair<'_>, config: &CompareConfig) -> StructuralVerdict {
    let column_coverage = pair.columns.coverage();
    let row_coverage = pair.rows.coverage();
    let verdict = |severity, reasons| StructuralVerdict {
        severity,
        reasons,
        column_coverage,
        row_coverage,
    };

    let related = config.related_structural_threshold;
    let mut unrelated = Vec::new();
    let has_columns = pair.columns.left_len.max(pair.columns.right_len) > 0;
    if has_columns && pair.columns.matched_count() == 0 {
        unrelated.push("no matching column labels".to_string());
    }
    if column_coverage < related {
        unrelated.push(format!(
            "column coverage {:.2} below related threshold {:.2}",
            column_coverage, related
        ));
    }
    if row_coverage < related {
        unrelated.push(format!(
            "row coverage {:.2} below related threshold {:.2}",
            row_coverage, related
        ));
    }
    if !unrelated.is_empty() {
        return verdict(StructuralSeverity::Total, unrelated);
    }

    let mut major = Vec::new();
    let mut minor = Vec::new();

    if pair.left_header_rows != pair.right_header_rows {
        major.push(format!(
            "header depth differs: left={}, right={}",
            pair.left_header_rows, pair.right_header_rows
        ));
    }
    for level in 0..pair.left_header_rows.min(pair.right_header_rows) {
        compare_header_level(pair, level, &mut major, &mut minor);
    }

    if !pair.columns.is_complete() || !pair.rows.is_complete() {
        let threshold = config.minor_structural_threshold;
        if column_coverage < threshold || row_coverage < threshold {
            major.push(format!(
                "substantial restructuring: column coverage {:.2}, row coverage {:.2}",
                column_coverage, row_coverage
            ));
        }
        describe_changes(
            "column",
            &pair.columns,
            &pair.left_columns,
            &pair.right_columns,
            &mut major,
        );
        describe_changes("row", &pair.rows, &pair.left_rows, &pair.right_rows, &mut major);
    }

    let result = if !major.is_empty() {
        verdict(StructuralSeverity::Major, major)
    } else if !minor.is_empty() {
        verdict(StructuralSeverity::Minor, minor)
    } else {
        verdict(StructuralSeverity::None, Vec::new())
    };

    tracing::debug!(
        severity = result.severity.as_str(),
        reasons = result.reasons.len(),
        "structural evaluation finished"
    );

    result
}

/// Header text at a level; positions covered by a vertical merge from an
/// upper level read as empty so that redrawn vertical merges compare equal.
fn header_text(table: &Table, level: usize, col: usize) -> &str {
    let cell = table.anchor(level, col);
    if cell.origin.0 < level {
        ""
    } else {
        &cell.content.folded
    }
}

fn compare_header_level(
    pair: &AlignedPair<'_>,
    level: usize,
    major: &mut Vec<String>,
    minor: &mut Vec<String>,
) {
    let matched: Vec<(usize, usize)> = pair.columns.matched().collect();
    let (left, right) = (pair.left, pair.right);

    for &(i, j) in &matched {
        let left_text = header_text(left, level, i);
        let right_text = header_text(right, level, j);
        if left_text != right_text {
            major.push(format!(
                "header level {} differs above column '{}': '{}' vs '{}'",
                level + 1,
                pair.left_columns[i],
                left_text,
                right_text
            ));
        } else if left.anchor(level, i).origin.0 != right.anchor(level, j).origin.0 {
            minor.push(format!(
                "header level {}: vertical merge above column '{}' redrawn",
                level + 1,
                pair.left_columns[i]
            ));
        }
    }

    for window in matched.windows(2) {
        let (i1, j1) = window[0];
        let (i2, j2) = window[1];
        let left_shared = left.anchor_id(level, i1) == left.anchor_id(level, i2);
        let right_shared = right.anchor_id(level, j1) == right.anchor_id(level, j2);
        if left_shared == right_shared {
            continue;
        }

        let message = format!(
            "header level {}: grouping of columns '{}' and '{}' differs",
            level + 1,
            pair.left_columns[i1],
            pair.left_columns[i2]
        );
        let all_blank = [
            header_text(left, level, i1),
            header_text(left, level, i2),
            header_text(right, level, j1),
            header_text(right, level, j2),
        ]
        .iter()
        .all(|text| text.is_empty());

        if all_blank {
            minor.push(message);
        } else {
            major.push(message);
        }
    }
}

fn describe_changes(
    axis: &str,
    alignment: &Alignment,
    left_labels: &[String],
    right_labels: &[String],
    reasons: &mut Vec<String>,
) {
    for left in alignment.deleted() {
        reasons.push(format!("{} deleted: '{}'", axis, left_labels[left]));
    }
    for right in alignment.inserted() {
        reasons.push(format!("{} inserted: '{}'", axis, right_labels[right]));
    }
}
