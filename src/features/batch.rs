//! Batch comparison of file pairs
//!
//! Reads a CSV with `left_path,right_path` columns, compares every pair and
//! writes one result row per pair:
//!
//! ```text
//! left_path,right_path,category,structure_match,summary
//! ```
//!
//! Relative paths resolve against the directory of the pairs file. A pair
//! that cannot be read or extracted still yields a row, classified as
//! `structure_diff_entirely` with the error as its summary.

use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::extract_path;
use crate::core::classify::Category;
use crate::core::compare::{compare, ComparisonResult};
use crate::utils::config::CompareConfig;
use crate::utils::error::TableError;

/// Columns of the results file
pub const RESULT_COLUMNS: [&str; 5] = [
    "left_path",
    "right_path",
    "category",
    "structure_match",
    "summary",
];

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// One input row of the pairs file
#[derive(Debug, Clone, Deserialize)]
struct PairRecord {
    left_path: String,
    right_path: String,
}

/// One output row of the results file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    pub left_path: String,
    pub right_path: String,
    pub category: Category,
    pub structure_match: bool,
    pub summary: String,
}

/// Read comparison options from a TOML file without validating them;
/// unset keys keep their defaults
pub fn read_config(path: &Path) -> Result<CompareConfig, BatchError> {
    let text = std::fs::read_to_string(path)?;
    let config: CompareConfig = toml::from_str(&text)?;
    tracing::debug!(path = %path.display(), "read configuration");
    Ok(config)
}

/// Read and validate comparison options from a TOML file
pub fn load_config(path: &Path) -> Result<CompareConfig, BatchError> {
    let config = read_config(path)?;
    config.validate()?;
    Ok(config)
}

/// Compare two documents on disk; extraction failures become a non-matching result
pub fn compare_files(
    left: &Path,
    right: &Path,
    config: &CompareConfig,
) -> Result<ComparisonResult, TableError> {
    // Configuration errors abort before any file is read
    config.validate()?;

    let extracted = extract_path(left).and_then(|l| extract_path(right).map(|r| (l, r)));
    match extracted {
        Ok((left_tables, right_tables)) => compare(&left_tables, &right_tables, config),
        Err(err) => {
            tracing::warn!(
                left = %left.display(),
                right = %right.display(),
                error = %err,
                "pair could not be extracted"
            );
            Ok(ComparisonResult::malformed(&err))
        }
    }
}

/// Run every pair listed in `pairs_csv` and write the results to `results_csv`
pub fn run_batch(
    pairs_csv: &Path,
    results_csv: &Path,
    config: &CompareConfig,
) -> Result<Vec<BatchRecord>, BatchError> {
    config.validate()?;

    let base = pairs_csv.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(pairs_csv)?;

    let mut records = Vec::new();
    for pair in reader.deserialize::<PairRecord>() {
        let pair = pair?;
        let left = resolve(&base, &pair.left_path);
        let right = resolve(&base, &pair.right_path);

        let result = compare_files(&left, &right, config)?;
        tracing::info!(
            left = %pair.left_path,
            right = %pair.right_path,
            category = result.category.as_str(),
            "compared pair"
        );

        records.push(BatchRecord {
            left_path: pair.left_path,
            right_path: pair.right_path,
            category: result.category,
            structure_match: result.structure_match(),
            summary: result.summary,
        });
    }

    // The header row is written even when no pair was listed
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(results_csv)?;
    writer.write_record(RESULT_COLUMNS)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    tracing::info!(pairs = records.len(), output = %results_csv.display(), "batch finished");
    Ok(records)
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_batch_writes_one_row_per_pair() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.csv"),
            "Variable,Placebo\nAge,65.3\nWeight,70.1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("changed.csv"),
            "Variable,Placebo\nAge,65.4\nWeight,70.1\n",
        )
        .unwrap();
        let pairs = dir.path().join("pairs.csv");
        fs::write(
            &pairs,
            "left_path,right_path\nbase.csv,base.csv\nbase.csv,changed.csv\nbase.csv,missing.csv\n",
        )
        .unwrap();
        let output = dir.path().join("results.csv");

        let records = run_batch(&pairs, &output, &CompareConfig::default()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].category, Category::Identical);
        assert_eq!(records[1].category, Category::DataDiffBeyondTolerance);
        assert!(records[1].structure_match);
        assert_eq!(records[2].category, Category::StructureDiffEntirely);
        assert!(!records[2].structure_match);
        assert!(records[2].summary.starts_with("IO error"));

        let written = fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("left_path,right_path,category,structure_match,summary")
        );
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabcmp.toml");
        fs::write(&path, "absolute_tolerance = 0.1\nprofile = \"binary\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.absolute_tolerance, 0.1);
        assert_eq!(config.profile, crate::utils::config::OutputProfile::Binary);

        assert_eq!(config.minor_structural_threshold, 0.8);
        assert_eq!(config.header_row_count, None);

        fs::write(&path, "absolute_tolerance = \"wide\"\n").unwrap();
        assert!(matches!(load_config(&path), Err(BatchError::Toml(_))));

        fs::write(&path, "unknown_key = 1\n").unwrap();
        assert!(matches!(load_config(&path), Err(BatchError::Toml(_))));
    }

    #[test]
    fn test_read_config_defers_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabcmp.toml");
        fs::write(&path, "minor_structural_threshold = 1.5\n").unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.minor_structural_threshold, 1.5);
        assert!(matches!(
            load_config(&path),
            Err(BatchError::Table(TableError::Configuration(_)))
        ));
    }

    #[test]
    fn test_invalid_config_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = dir.path().join("pairs.csv");
        fs::write(&pairs, "left_path,right_path\n").unwrap();
        let config = CompareConfig {
            minor_structural_threshold: 2.0,
            ..CompareConfig::default()
        };

        let err = run_batch(&pairs, &dir.path().join("out.csv"), &config).unwrap_err();
        assert!(matches!(err, BatchError::Table(TableError::Configuration(_))));
    }
}
