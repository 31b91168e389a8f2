//! Column/Row Aligner
//!
//! Order-preserving matching between two label sequences, computed once per
//! axis. The matching is a longest common subsequence under exact equality
//! of folded labels; among the maximal matchings the one whose matched pairs
//! stay closest to the diagonal (smallest total `|i - j|`) wins, so duplicate
//! labels align reproducibly.

use serde::Serialize;

use super::table::Table;
use crate::utils::config::CompareConfig;

/// One step of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AlignOp {
    Matched { left: usize, right: usize },
    /// Present only on the right side
    Inserted { right: usize },
    /// Present only on the left side
    Deleted { left: usize },
}

/// Monotonic, non-crossing matching between two index spaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub ops: Vec<AlignOp>,
    pub left_len: usize,
    pub right_len: usize,
}

impl Alignment {
    /// Matched `(left, right)` index pairs in order
    pub fn matched(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ops.iter().filter_map(|op| match *op {
            AlignOp::Matched { left, right } => Some((left, right)),
            _ => None,
        })
    }

    pub fn matched_count(&self) -> usize {
        self.matched().count()
    }

    pub fn inserted(&self) -> impl Iterator<Item = usize> + '_ {
        self.ops.iter().filter_map(|op| match *op {
            AlignOp::Inserted { right } => Some(right),
            _ => None,
        })
    }

    pub fn deleted(&self) -> impl Iterator<Item = usize> + '_ {
        self.ops.iter().filter_map(|op| match *op {
            AlignOp::Deleted { left } => Some(left),
            _ => None,
        })
    }

    /// Matched count over the longer sequence; two empty sequences cover fully
    pub fn coverage(&self) -> f64 {
        let longest = self.left_len.max(self.right_len);
        if longest == 0 {
            1.0
        } else {
            self.matched_count() as f64 / longest as f64
        }
    }

    /// Whether every entry on both sides is matched
    pub fn is_complete(&self) -> bool {
        self.left_len == self.right_len && self.matched_count() == self.left_len
    }
}

/// Best suffix solution: most matches, then least diagonal drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Score {
    matches: u32,
    drift: u64,
}

impl Score {
    fn better_than(&self, other: &Score) -> bool {
        self.matches > other.matches || (self.matches == other.matches && self.drift < other.drift)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Match,
    Delete,
    Insert,
}

/// Align two label sequences
pub fn align<S: AsRef<str>>(left: &[S], right: &[S]) -> Alignment {
    let n = left.len();
    let m = right.len();
    let stride = m + 1;

    // score[i * stride + j]: best alignment of left[i..] with right[j..]
    let mut score = vec![Score::default(); (n + 1) * stride];
    let mut step = vec![Step::Insert; (n + 1) * stride];

    for i in (0..=n).rev() {
        for j in (0..=m).rev() {
            let at = i * stride + j;
            if i == n && j == m {
                continue;
            }
            if i == n {
                score[at] = score[at + 1];
                step[at] = Step::Insert;
                continue;
            }
            if j == m {
                score[at] = score[at + stride];
                step[at] = Step::Delete;
                continue;
            }

            // Ties prefer a match, then a deletion, over an insertion
            let mut best = score[at + 1];
            let mut best_step = Step::Insert;

            let delete = score[at + stride];
            if !best.better_than(&delete) {
                best = delete;
                best_step = Step::Delete;
            }

            if left[i].as_ref() == right[j].as_ref() {
                let next = score[at + stride + 1];
                let matched = Score {
                    matches: next.matches + 1,
                    drift: next.drift + i.abs_diff(j) as u64,
                };
                if !best.better_than(&matched) {
                    best = matched;
                    best_step = Step::Match;
                }
            }

            score[at] = best;
            step[at] = best_step;
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        match step[i * stride + j] {
            Step::Match => {
                ops.push(AlignOp::Matched { left: i, right: j });
                i += 1;
                j += 1;
            }
            Step::Delete => {
                ops.push(AlignOp::Deleted { left: i });
                i += 1;
            }
            Step::Insert => {
                ops.push(AlignOp::Inserted { right: j });
                j += 1;
            }
        }
    }

    Alignment {
        ops,
        left_len: n,
        right_len: m,
    }
}

/// Label of every column: the top-most header anchor, or the deepest
/// non-empty header text when the top anchor is a horizontal merge or empty.
pub fn column_labels(table: &Table, header_rows: usize) -> Vec<String> {
    (0..table.column_count())
        .map(|col| {
            if header_rows == 0 {
                return format!("#{}", col);
            }

            let top = table.anchor(0, col);
            if top.colspan == 1 && !top.is_empty() {
                return top.content.folded.clone();
            }

            (0..header_rows)
                .rev()
                .map(|row| table.anchor(row, col))
                .find(|cell| !cell.is_empty())
                .map(|cell| cell.content.folded.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// Key of every body row: its label-column text, else its whole content,
/// else its position.
pub fn row_keys(table: &Table, header_rows: usize, label_column: usize) -> Vec<String> {
    (header_rows..table.row_count())
        .map(|row| {
            if label_column < table.column_count() {
                let label = table.anchor(row, label_column);
                if !label.is_empty() {
                    return label.content.folded.clone();
                }
            }

            let content: Vec<&str> = table
                .row(row)
                .positions()
                .map(|cell| cell.content.folded.as_str())
                .collect();
            if content.iter().any(|text| !text.is_empty()) {
                content.join(" | ")
            } else {
                format!("#{}", row - header_rows)
            }
        })
        .collect()
}

/// Two tables with their labels and both axis alignments
#[derive(Debug, Clone)]
pub struct AlignedPair<'a> {
    pub left: &'a Table,
    pub right: &'a Table,
    pub left_header_rows: usize,
    pub right_header_rows: usize,
    pub left_columns: Vec<String>,
    pub right_columns: Vec<String>,
    pub left_rows: Vec<String>,
    pub right_rows: Vec<String>,
    pub columns: Alignment,
    /// Body rows only, indexed from the first row after the header block
    pub rows: Alignment,
}

impl<'a> AlignedPair<'a> {
    pub fn new(left: &'a Table, right: &'a Table, config: &CompareConfig) -> Self {
        let left_header_rows = left.effective_header_rows(config.header_row_count);
        let right_header_rows = right.effective_header_rows(config.header_row_count);

        let left_columns = column_labels(left, left_header_rows);
        let right_columns = column_labels(right, right_header_rows);
        let left_rows = row_keys(left, left_header_rows, config.label_column_index);
        let right_rows = row_keys(right, right_header_rows, config.label_column_index);

        let columns = align(&left_columns, &right_columns);
        let rows = align(&left_rows, &right_rows);

        tracing::debug!(
            column_coverage = columns.coverage(),
            row_coverage = rows.coverage(),
            "aligned {}x{} against {}x{}",
            left.row_count(),
            left.column_count(),
            right.row_count(),
            right.column_count()
        );

        AlignedPair {
            left,
            right,
            left_header_rows,
            right_header_rows,
            left_columns,
            right_columns,
            left_rows,
            right_rows,
            columns,
            rows,
        }
    }

    /// Grid row of a left body row
    pub fn left_grid_row(&self, body_row: usize) -> usize {
        self.left_header_rows + body_row
    }

    /// Grid row of a right body row
    pub fn right_grid_row(&self, body_row: usize) -> usize {
        self.right_header_rows + body_row
    }
}
