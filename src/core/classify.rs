//! Classifier
//!
//! Merges a structural and a content verdict into one category of a fixed,
//! totally ordered taxonomy. The worst applicable category wins:
//!
//! ```text
//! TOTAL structure  -> structure_diff_entirely
//! MAJOR structure  -> structure_diff
//! BEYOND tolerance -> data_diff_beyond_tolerance
//! WITHIN tolerance -> data_diff_within_tolerance
//! style / MINOR    -> style_diff
//! otherwise        -> identical
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::content::{ContentVerdict, DataSeverity};
use super::structure::{StructuralSeverity, StructuralVerdict};
use crate::utils::config::OutputProfile;
use crate::utils::error::TableError;

/// Comparison outcome, ordered from best to worst
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Identical,
    StyleDiff,
    DataDiffWithinTolerance,
    DataDiffBeyondTolerance,
    StructureDiff,
    StructureDiffEntirely,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Identical,
        Category::StyleDiff,
        Category::DataDiffWithinTolerance,
        Category::DataDiffBeyondTolerance,
        Category::StructureDiff,
        Category::StructureDiffEntirely,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Identical => "identical",
            Category::StyleDiff => "style_diff",
            Category::DataDiffWithinTolerance => "data_diff_within_tolerance",
            Category::DataDiffBeyondTolerance => "data_diff_beyond_tolerance",
            Category::StructureDiff => "structure_diff",
            Category::StructureDiffEntirely => "structure_diff_entirely",
        }
    }

    /// Whether the structures are similar enough to compare cell by cell
    pub fn structure_match(&self) -> bool {
        *self < Category::StructureDiff
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| TableError::parse(format!("unknown category '{}'", s)))
    }
}

/// Final classification of one table pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: Category,
    /// Binary verdict: true unless the structure or the text differs
    pub matches: bool,
    /// Summary for the requested output profile
    pub summary: String,
}

/// Classify a pair of verdicts
pub fn classify(
    structural: &StructuralVerdict,
    content: &ContentVerdict,
    profile: OutputProfile,
) -> Classification {
    let evidence = collect_evidence(structural, content);
    let category = evidence
        .keys()
        .copied()
        .max()
        .unwrap_or(Category::Identical);

    let textual: Vec<String> = content
        .diffs
        .iter()
        .filter(|d| d.cause.is_textual())
        .map(|d| d.describe())
        .collect();
    let matches = structural.severity < StructuralSeverity::Major && textual.is_empty();

    let summary = match profile {
        OutputProfile::Taxonomy => match evidence.get(&category) {
            Some(items) => summarize(category, items),
            None => "tables are identical".to_string(),
        },
        OutputProfile::Binary => {
            if structural.severity >= StructuralSeverity::Major {
                summarize(category, &structural.reasons)
            } else if let Some(first) = textual.first() {
                format!("text differs: {}", first)
            } else {
                "tables match".to_string()
            }
        }
    };

    Classification {
        category,
        matches,
        summary,
    }
}

/// Descriptions of every difference, keyed by the category it implies
fn collect_evidence(
    structural: &StructuralVerdict,
    content: &ContentVerdict,
) -> IndexMap<Category, Vec<String>> {
    let mut evidence: IndexMap<Category, Vec<String>> = IndexMap::new();

    let structural_category = match structural.severity {
        StructuralSeverity::Total => Some(Category::StructureDiffEntirely),
        StructuralSeverity::Major => Some(Category::StructureDiff),
        StructuralSeverity::Minor => Some(Category::StyleDiff),
        StructuralSeverity::None => None,
    };
    if let Some(category) = structural_category {
        evidence
            .entry(category)
            .or_default()
            .extend(structural.reasons.iter().cloned());
    }

    for diff in &content.diffs {
        let category = match diff.severity {
            DataSeverity::BeyondTolerance => Category::DataDiffBeyondTolerance,
            DataSeverity::WithinTolerance => Category::DataDiffWithinTolerance,
            DataSeverity::None => Category::StyleDiff,
        };
        evidence.entry(category).or_default().push(diff.describe());
    }

    evidence.retain(|_, items| !items.is_empty());
    evidence
}

fn summarize(category: Category, items: &[String]) -> String {
    match items {
        [] => category.as_str().to_string(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}
