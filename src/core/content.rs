//! Content Differ
//!
//! Compares the cells of matched (row, column) pairs. Unmatched rows and
//! columns are scored structurally and never examined here. Each distinct
//! pair of anchors is compared once, so a merged cell counts as one
//! difference however many positions it covers.

use std::collections::HashSet;

use serde::Serialize;

use super::align::AlignedPair;
use super::normalize::ContentKind;
use super::table::{Cell, CellId};
use crate::utils::config::CompareConfig;

/// How much matched values differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSeverity {
    #[default]
    None,
    WithinTolerance,
    BeyondTolerance,
}

impl DataSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSeverity::None => "NONE",
            DataSeverity::WithinTolerance => "WITHIN_TOLERANCE",
            DataSeverity::BeyondTolerance => "BEYOND_TOLERANCE",
        }
    }
}

/// Why two matched cells differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffCause {
    /// Content kinds disagree (e.g. numeric vs string)
    KindMismatch,
    /// String cells differ after normalization
    Text,
    /// Composite cells differ in their non-numeric text or token count
    Skeleton,
    /// Numeric tokens differ
    Numeric,
    /// Content agrees, formatting does not
    Style,
}

impl DiffCause {
    /// Whether the cause concerns the text itself rather than numbers or formatting
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            DiffCause::KindMismatch | DiffCause::Text | DiffCause::Skeleton
        )
    }
}

/// One differing matched position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDiff {
    /// Grid position (row, column) on the left
    pub left: (usize, usize),
    /// Grid position (row, column) on the right
    pub right: (usize, usize),
    pub row_label: String,
    pub column_label: String,
    pub left_text: String,
    pub right_text: String,
    pub cause: DiffCause,
    /// `None` for style-only differences
    pub severity: DataSeverity,
    /// Differing style attributes, empty unless `cause` is `Style`
    pub style_attributes: Vec<&'static str>,
}

impl CellDiff {
    /// Short description naming the position and both values
    pub fn describe(&self) -> String {
        match self.cause {
            DiffCause::Style => format!(
                "{} differs at row '{}', column '{}'",
                self.style_attributes.join("/"),
                self.row_label,
                self.column_label
            ),
            _ => format!(
                "'{}' vs '{}' at row '{}', column '{}'",
                self.left_text, self.right_text, self.row_label, self.column_label
            ),
        }
    }
}

/// Content verdict for one table pair
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ContentVerdict {
    pub data_severity: DataSeverity,
    pub style_differs: bool,
    pub diffs: Vec<CellDiff>,
}

impl ContentVerdict {
    /// Data differences of exactly the given severity
    pub fn data_diffs(&self, severity: DataSeverity) -> impl Iterator<Item = &CellDiff> {
        self.diffs
            .iter()
            .filter(move |d| d.cause != DiffCause::Style && d.severity == severity)
    }

    pub fn style_diffs(&self) -> impl Iterator<Item = &CellDiff> {
        self.diffs.iter().filter(|d| d.cause == DiffCause::Style)
    }
}

/// Whether a token pair agrees under the configured tolerance
pub fn within_tolerance(a: f64, b: f64, config: &CompareConfig) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return a == b;
    }
    let magnitude = a.abs().max(b.abs());
    let bound = config
        .absolute_tolerance
        .max(config.relative_tolerance * magnitude);
    // A few ULPs of slack so that 65.4 - 65.3 stays within a 0.1 bound
    let slack = 4.0 * f64::EPSILON * magnitude.max(1.0);
    (a - b).abs() <= bound + slack
}

/// Compare two cells' content; `None` when they agree exactly
pub fn compare_cells(
    left: &Cell,
    right: &Cell,
    config: &CompareConfig,
) -> Option<(DiffCause, DataSeverity)> {
    let (l, r) = (&left.content, &right.content);

    if l.kind != r.kind {
        return Some((DiffCause::KindMismatch, DataSeverity::BeyondTolerance));
    }

    match l.kind {
        ContentKind::Empty => None,
        ContentKind::String => {
            (l.folded != r.folded).then_some((DiffCause::Text, DataSeverity::BeyondTolerance))
        }
        ContentKind::Numeric | ContentKind::Composite => {
            if l.skeleton != r.skeleton || l.tokens.len() != r.tokens.len() {
                return Some((DiffCause::Skeleton, DataSeverity::BeyondTolerance));
            }

            let mut severity = DataSeverity::None;
            for (&a, &b) in l.tokens.iter().zip(&r.tokens) {
                if a == b {
                    continue;
                }
                if within_tolerance(a, b, config) {
                    severity = severity.max(DataSeverity::WithinTolerance);
                } else {
                    return Some((DiffCause::Numeric, DataSeverity::BeyondTolerance));
                }
            }

            (severity != DataSeverity::None).then_some((DiffCause::Numeric, severity))
        }
    }
}

/// Diff the matched body cells and the header styles of matched columns
pub fn diff(pair: &AlignedPair<'_>, config: &CompareConfig) -> ContentVerdict {
    let mut verdict = ContentVerdict::default();
    let mut seen: HashSet<(CellId, CellId)> = HashSet::new();
    let columns: Vec<(usize, usize)> = pair.columns.matched().collect();

    // Header cells carry structure; only their formatting is compared here
    for level in 0..pair.left_header_rows.min(pair.right_header_rows) {
        for &(i, j) in &columns {
            let (left_id, right_id) = (
                pair.left.anchor_id(level, i),
                pair.right.anchor_id(level, j),
            );
            if !seen.insert((left_id, right_id)) {
                continue;
            }
            let (left, right) = (pair.left.cell(left_id), pair.right.cell(right_id));
            if compare_cells(left, right, config).is_none() {
                push_style_diff(
                    &mut verdict,
                    (level, i),
                    (level, j),
                    format!("header {}", level + 1),
                    pair.left_columns[i].clone(),
                    left,
                    right,
                );
            }
        }
    }

    for (row_l, row_r) in pair.rows.matched() {
        let (grid_l, grid_r) = (pair.left_grid_row(row_l), pair.right_grid_row(row_r));

        for &(i, j) in &columns {
            let (left_id, right_id) = (
                pair.left.anchor_id(grid_l, i),
                pair.right.anchor_id(grid_r, j),
            );
            if !seen.insert((left_id, right_id)) {
                continue;
            }
            let (left, right) = (pair.left.cell(left_id), pair.right.cell(right_id));
            let row_label = pair.left_rows[row_l].clone();
            let column_label = pair.left_columns[i].clone();

            match compare_cells(left, right, config) {
                Some((cause, severity)) => {
                    verdict.data_severity = verdict.data_severity.max(severity);
                    verdict.diffs.push(CellDiff {
                        left: (grid_l, i),
                        right: (grid_r, j),
                        row_label,
                        column_label,
                        left_text: left.content.display.clone(),
                        right_text: right.content.display.clone(),
                        cause,
                        severity,
                        style_attributes: Vec::new(),
                    });
                    if severity != DataSeverity::BeyondTolerance {
                        push_style_diff(
                            &mut verdict,
                            (grid_l, i),
                            (grid_r, j),
                            pair.left_rows[row_l].clone(),
                            pair.left_columns[i].clone(),
                            left,
                            right,
                        );
                    }
                }
                None => push_style_diff(
                    &mut verdict,
                    (grid_l, i),
                    (grid_r, j),
                    row_label,
                    column_label,
                    left,
                    right,
                ),
            }
        }
    }

    tracing::debug!(
        data_severity = verdict.data_severity.as_str(),
        style_differs = verdict.style_differs,
        diffs = verdict.diffs.len(),
        "content diff finished"
    );

    verdict
}

fn push_style_diff(
    verdict: &mut ContentVerdict,
    left_pos: (usize, usize),
    right_pos: (usize, usize),
    row_label: String,
    column_label: String,
    left: &Cell,
    right: &Cell,
) {
    let attributes = left.style.differences(&right.style);
    if attributes.is_empty() {
        return;
    }

    verdict.style_differs = true;
    verdict.diffs.push(CellDiff {
        left: left_pos,
        right: right_pos,
        row_label,
        column_label,
        left_text: left.content.display.clone(),
        right_text: right.content.display.clone(),
        cause: DiffCause::Style,
        severity: DataSeverity::None,
        style_attributes: attributes,
    });
}
