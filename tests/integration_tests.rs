//! Integration tests for tabcmp table comparison

use tabcmp::{
    compare, Category, CellSpec, CellStyle, CompareConfig, ComparisonResult, DataSeverity,
    Extractor, OutputProfile, RtfExtractor, StructuralSeverity, Table, TableBuilder,
};

// ============================================================================
// Fixtures
// ============================================================================

fn flat(columns: &[&str], rows: &[&[&str]]) -> Table {
    let mut builder = TableBuilder::new().header_row(columns.iter().copied());
    for row in rows {
        builder = builder.body_row(row.iter().copied());
    }
    builder.build().unwrap()
}

fn baseline() -> Table {
    flat(
        &["Variable", "Placebo", "Active"],
        &[
            &["Age, mean (SD)", "65.3 (10.2)", "64.9 (9.8)"],
            &["Female, n (%)", "30 (50.0%)", "28 (46.7%)"],
            &["Male, n (%)", "30 (50.0%)", "32 (53.3%)"],
        ],
    )
}

fn with_age(age: &str) -> Table {
    flat(
        &["Variable", "Placebo", "Active"],
        &[
            &["Age, mean (SD)", age, "64.9 (9.8)"],
            &["Female, n (%)", "30 (50.0%)", "28 (46.7%)"],
            &["Male, n (%)", "30 (50.0%)", "32 (53.3%)"],
        ],
    )
}

fn grouped() -> Table {
    TableBuilder::new()
        .header_row([
            CellSpec::with_span("Variable", 2, 1),
            CellSpec::with_span("Placebo (N=60)", 1, 2),
            CellSpec::with_span("Active (N=60)", 1, 2),
        ])
        .header_row(["n", "%", "n", "%"])
        .body_row(["Female", "30", "50.0", "28", "46.7"])
        .body_row(["Male", "30", "50.0", "32", "53.3"])
        .build()
        .unwrap()
}

fn run(left: Table, right: Table, config: &CompareConfig) -> ComparisonResult {
    compare(&[left], &[right], config).unwrap()
}

const H1: &str = r"\clvmgf\cellx2000\clmgf\cellx3000\clmrg\cellx4000\clmgf\cellx5000\clmrg\cellx6000";
const H2: &str = r"\clvmrg\cellx2000\cellx3000\cellx4000\cellx5000\cellx6000";
const BODY: &str = r"\cellx2000\cellx3000\cellx4000\cellx5000\cellx6000";

fn rtf_row(header: bool, defs: &str, cells: &[&str]) -> String {
    let mut row = String::from(r"\trowd");
    if header {
        row.push_str(r"\trhdr");
    }
    row.push_str(defs);
    row.push('\n');
    for cell in cells {
        row.push_str(r"\pard\intbl ");
        row.push_str(cell);
        row.push_str(r"\cell");
    }
    row.push_str("\\row\n");
    row
}

fn demographics_rtf(age: &str, bold_header: bool) -> String {
    let variable = if bold_header {
        r"{\b Variable}"
    } else {
        "Variable"
    };

    let mut rtf = String::from("{\\rtf1\\ansi{\\fonttbl{\\f0 Courier New;}}\n");
    rtf.push_str("\\pard Table 14.1.1 Demographics\\par\n");
    rtf.push_str(&rtf_row(
        true,
        H1,
        &[variable, "Placebo (N=60)", "", "Active (N=60)", ""],
    ));
    rtf.push_str(&rtf_row(true, H2, &["", "n", "%", "n", "%"]));
    rtf.push_str(&rtf_row(
        false,
        BODY,
        &["Female", "30", "50.0", "28", "46.7"],
    ));
    rtf.push_str(&rtf_row(
        false,
        BODY,
        &["Age (years)", age, "", "64.9 (9.8)", ""],
    ));
    rtf.push_str("\\pard\\par}");
    rtf
}

const SPANNER: &str = r"\cellx2400\cellx4000\cellx5600\cellx7200\cellx8800";
const WIDE_BODY: &str =
    r"\cellx2400\cellx3200\cellx4000\cellx4800\cellx5600\cellx6400\cellx7200\cellx8000\cellx8800";
const FULL_WIDTH: &str = r"\cellx8800";

/// Grouped columns drawn by cell width alone, followed by footnote rows
fn adverse_events_rtf(any_ae: &str, footnote: &str) -> String {
    let mut rtf = String::from("{\\rtf1\\ansi\n");
    rtf.push_str(&rtf_row(
        false,
        SPANNER,
        &["", "Placebo", "Low Dose", "High Dose", "Total"],
    ));
    rtf.push_str(&rtf_row(
        false,
        WIDE_BODY,
        &["System Organ Class", "n", "(%)", "n", "(%)", "n", "(%)", "n", "(%)"],
    ));
    rtf.push_str(&rtf_row(
        false,
        WIDE_BODY,
        &["Any AE", any_ae, "(50.0)", "28", "(46.7)", "31", "(51.7)", "89", "(49.4)"],
    ));
    rtf.push_str(&rtf_row(
        false,
        WIDE_BODY,
        &["Headache", "5", "(8.3)", "7", "(11.7)", "6", "(10.0)", "18", "(10.0)"],
    ));
    rtf.push_str(&rtf_row(false, FULL_WIDTH, &[footnote]));
    rtf.push_str(&rtf_row(false, FULL_WIDTH, &["Source: adae"]));
    rtf.push('}');
    rtf
}

fn extract_rtf(rtf: &str) -> Vec<Table> {
    RtfExtractor.extract(rtf).unwrap()
}

// ============================================================================
// Classification properties
// ============================================================================

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reflexivity() {
        for table in [baseline(), grouped(), TableBuilder::new().build().unwrap()] {
            let result = run(table.clone(), table, &CompareConfig::default());
            assert_eq!(result.category, Category::Identical);
            assert!(result.matches);
            assert!(result.diffs.is_empty());
        }
    }

    #[test]
    fn test_structural_symmetry() {
        let pairs = [
            (baseline(), with_age("70.0 (1.0)")),
            (
                baseline(),
                flat(
                    &["Variable", "Placebo", "Active", "Total"],
                    &[&["Age, mean (SD)", "65.3 (10.2)", "64.9 (9.8)", "65.1 (10.0)"]],
                ),
            ),
            (grouped(), baseline()),
        ];

        let config = CompareConfig::default();
        for (a, b) in pairs {
            let forward = run(a.clone(), b.clone(), &config);
            let backward = run(b, a, &config);
            assert_eq!(forward.structural_severity, backward.structural_severity);
        }
    }

    #[test]
    fn test_tolerance_monotonicity() {
        let mut previous = Category::StructureDiffEntirely;
        for tolerance in [0.0, 0.05, 0.1, 0.5, 5.0] {
            let config = CompareConfig::new().with_absolute_tolerance(tolerance);
            let category = run(baseline(), with_age("65.4 (10.3)"), &config).category;
            assert!(
                category <= previous,
                "tolerance {} raised the category to {}",
                tolerance,
                category
            );
            previous = category;
        }

        let mut previous = Category::StructureDiffEntirely;
        for tolerance in [0.0, 0.001, 0.01, 0.1] {
            let config = CompareConfig::new().with_relative_tolerance(tolerance);
            let category = run(baseline(), with_age("66.0 (10.2)"), &config).category;
            assert!(category <= previous);
            previous = category;
        }
    }

    #[test]
    fn test_precedence_structure_over_data() {
        let right = flat(
            &["Variable", "Placebo", "Active", "Total"],
            &[
                &["Age, mean (SD)", "99.9 (1.0)", "64.9 (9.8)", "65.1 (10.0)"],
                &["Female, n (%)", "30 (50.0%)", "28 (46.7%)", "58 (48.3%)"],
                &["Male, n (%)", "30 (50.0%)", "32 (53.3%)", "62 (51.7%)"],
            ],
        );
        let result = run(baseline(), right, &CompareConfig::default());

        assert_eq!(result.category, Category::StructureDiff);
        assert_eq!(result.data_severity, DataSeverity::BeyondTolerance);
    }

    #[test]
    fn test_column_insertion() {
        let right = flat(
            &["Variable", "Placebo", "Active", "Total"],
            &[
                &["Age, mean (SD)", "65.3 (10.2)", "64.9 (9.8)", "65.1 (10.0)"],
                &["Female, n (%)", "30 (50.0%)", "28 (46.7%)", "58 (48.3%)"],
                &["Male, n (%)", "30 (50.0%)", "32 (53.3%)", "62 (51.7%)"],
            ],
        );
        let result = run(baseline(), right, &CompareConfig::default());

        assert_eq!(result.category, Category::StructureDiff);
        assert_eq!(result.structural_severity, StructuralSeverity::Major);
        assert_eq!(result.tables[0].structural.column_coverage, 0.75);
        assert_eq!(result.data_severity, DataSeverity::None);
        assert!(result
            .tables[0]
            .structural
            .reasons
            .contains(&"column inserted: 'total'".to_string()));
    }

    #[test]
    fn test_total_mismatch() {
        let right = flat(
            &["Subject", "Visit", "Lab test", "Result", "Unit"],
            &[&["1001", "Baseline", "ALT", "23", "U/L"]],
        );
        let result = run(baseline(), right, &CompareConfig::default());

        assert_eq!(result.category, Category::StructureDiffEntirely);
        assert!(!result.matches);
        assert!(!result.structure_match());
    }

    #[test]
    fn test_numeric_tolerance() {
        let within = CompareConfig::new().with_absolute_tolerance(0.1);
        let result = run(baseline(), with_age("65.4 (10.2)"), &within);
        assert_eq!(result.category, Category::DataDiffWithinTolerance);
        assert!(result.matches);

        let tight = CompareConfig::new().with_absolute_tolerance(0.05);
        let result = run(baseline(), with_age("65.4 (10.2)"), &tight);
        assert_eq!(result.category, Category::DataDiffBeyondTolerance);
        assert_eq!(result.diffs.len(), 1);
        assert_eq!(result.diffs[0].row_label, "age, mean (sd)");
        assert_eq!(result.diffs[0].column_label, "placebo");
        assert_eq!(result.diffs[0].left, (1, 1));
    }

    #[test]
    fn test_style_only() {
        let right = TableBuilder::new()
            .header_row(["Variable", "Placebo", "Active"])
            .body_row([
                CellSpec::new("Age, mean (SD)").styled(CellStyle::bold()),
                CellSpec::new("65.3 (10.2)"),
                CellSpec::new("64.9 (9.8)"),
            ])
            .body_row(["Female, n (%)", "30 (50.0%)", "28 (46.7%)"])
            .body_row(["Male, n (%)", "30 (50.0%)", "32 (53.3%)"])
            .build()
            .unwrap();
        let result = run(baseline(), right, &CompareConfig::default());

        assert_eq!(result.category, Category::StyleDiff);
        assert!(result.style_differs);
        assert_eq!(result.data_severity, DataSeverity::None);
        assert!(result.summary.contains("bold"));
    }

    #[test]
    fn test_idempotence() {
        let config = CompareConfig::new().with_absolute_tolerance(0.05);
        let first = run(baseline(), with_age("65.4 (10.2)"), &config);
        let second = run(baseline(), with_age("65.4 (10.2)"), &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_row_deletion() {
        let right = flat(
            &["Variable", "Placebo", "Active"],
            &[
                &["Age, mean (SD)", "65.3 (10.2)", "64.9 (9.8)"],
                &["Female, n (%)", "30 (50.0%)", "28 (46.7%)"],
            ],
        );
        let result = run(baseline(), right, &CompareConfig::default());

        assert_eq!(result.category, Category::StructureDiff);
        assert!(result.summary.starts_with("substantial restructuring"));
        assert!(result.tables[0]
            .structural
            .reasons
            .contains(&"row deleted: 'male, n (%)'".to_string()));
    }
}

// ============================================================================
// Output profiles and configuration
// ============================================================================

mod profiles {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_binary_ignores_numeric_differences() {
        let result = run(baseline(), with_age("70.0 (12.0)"), &CompareConfig::binary());
        assert_eq!(result.category, Category::DataDiffBeyondTolerance);
        assert!(result.matches);
        assert_eq!(result.summary, "tables match");
    }

    #[test]
    fn test_binary_flags_text_differences() {
        let result = run(baseline(), with_age("NE"), &CompareConfig::binary());
        assert!(!result.matches);
        assert!(result.summary.starts_with("text differs"));
    }

    #[test]
    fn test_binary_flags_structure() {
        let right = flat(&["Variable", "Placebo"], &[&["Age, mean (SD)", "65.3 (10.2)"]]);
        let config = CompareConfig::new().with_profile(OutputProfile::Binary);
        let result = run(baseline(), right, &config);
        assert!(!result.matches);
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let config = CompareConfig {
            related_structural_threshold: 0.9,
            minor_structural_threshold: 0.5,
            ..CompareConfig::default()
        };
        assert!(compare(&[baseline()], &[baseline()], &config).is_err());
    }

    #[test]
    fn test_header_row_override() {
        let config = CompareConfig::new().with_header_rows(0);
        let result = run(baseline(), baseline(), &config);
        assert_eq!(result.category, Category::Identical);
    }
}

// ============================================================================
// RTF extraction
// ============================================================================

mod rtf {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grouped_header_extraction() {
        let tables = extract_rtf(&demographics_rtf("65.3 (10.2)", false));
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.caption(), Some("Table 14.1.1 Demographics"));
        assert_eq!(table.column_count(), 5);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.header_row_count(), 2);
        assert_eq!(table.anchor(0, 2).content.display, "Placebo (N=60)");
        assert_eq!(table.anchor(0, 1).colspan, 2);
        assert_eq!(table.anchor(1, 0).content.display, "Variable");
        assert_eq!(table.anchor(3, 1).content.display, "65.3 (10.2)");
    }

    #[test]
    fn test_rtf_reflexivity() {
        let left = extract_rtf(&demographics_rtf("65.3 (10.2)", false));
        let right = extract_rtf(&demographics_rtf("65.3 (10.2)", false));
        let result = compare(&left, &right, &CompareConfig::default()).unwrap();
        assert!(result.is_identical());
    }

    #[test]
    fn test_rtf_value_change() {
        let left = extract_rtf(&demographics_rtf("65.3 (10.2)", false));
        let right = extract_rtf(&demographics_rtf("65.4 (10.2)", false));

        let config = CompareConfig::new().with_absolute_tolerance(0.1);
        let result = compare(&left, &right, &config).unwrap();
        assert_eq!(result.category, Category::DataDiffWithinTolerance);

        let result = compare(&left, &right, &CompareConfig::default()).unwrap();
        assert_eq!(result.category, Category::DataDiffBeyondTolerance);
    }

    #[test]
    fn test_rtf_bold_header_is_style_diff() {
        let left = extract_rtf(&demographics_rtf("65.3 (10.2)", false));
        let right = extract_rtf(&demographics_rtf("65.3 (10.2)", true));
        assert!(right[0].anchor(0, 0).style.bold);
        assert!(!right[0].anchor(2, 0).style.bold);

        let result = compare(&left, &right, &CompareConfig::default()).unwrap();
        assert_eq!(result.category, Category::StyleDiff);
    }

    #[test]
    fn test_width_spanned_header_with_footnotes() {
        let left = extract_rtf(&adverse_events_rtf("30", "Subjects are counted once."));
        let table = &left[0];
        assert_eq!(table.column_count(), 9);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.header_row_count(), 2);
        assert_eq!(table.anchor(0, 4).content.display, "Low Dose");
        assert_eq!(table.anchor(0, 4).colspan, 2);

        // Footnote rows take no part in the comparison
        let right = extract_rtf(&adverse_events_rtf("30", "MedDRA version 26.0."));
        let result = compare(&left, &right, &CompareConfig::default()).unwrap();
        assert!(result.is_identical());

        let right = extract_rtf(&adverse_events_rtf("31", "Subjects are counted once."));
        let result = compare(&left, &right, &CompareConfig::default()).unwrap();
        assert_eq!(result.category, Category::DataDiffBeyondTolerance);
        assert_eq!(result.structural_severity, StructuralSeverity::None);
    }

    #[test]
    fn test_malformed_rtf_becomes_non_matching_result() {
        let err = RtfExtractor
            .extract("{\\rtf1\\trowd\\cellx1000\\cellx2000\\pard\\intbl A\\cell\\row}")
            .unwrap_err();
        assert!(err.is_malformed());

        let result = ComparisonResult::malformed(&err);
        assert_eq!(result.category, Category::StructureDiffEntirely);
        assert!(!result.matches);
        assert!(result.error.is_some());
    }
}

// ============================================================================
// Batch driver
// ============================================================================

#[cfg(feature = "batch")]
mod batch {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tabcmp::run_batch;

    #[test]
    fn test_rtf_and_csv_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("ref.rtf"), demographics_rtf("65.3 (10.2)", false)).unwrap();
        fs::write(root.join("new.rtf"), demographics_rtf("65.4 (10.2)", false)).unwrap();
        fs::write(
            root.join("broken.rtf"),
            "{\\rtf1\\trowd\\cellx1000\\cellx2000\\pard\\intbl A\\cell\\row}",
        )
        .unwrap();
        fs::write(root.join("ref.csv"), "Variable,Placebo\nAge,65.3\n").unwrap();
        fs::write(root.join("new.csv"), "Variable,Placebo\nAge,65.3\n").unwrap();

        let pairs = root.join("pairs.csv");
        fs::write(
            &pairs,
            "left_path,right_path\n\
             ref.rtf,ref.rtf\n\
             ref.rtf,new.rtf\n\
             ref.rtf,broken.rtf\n\
             ref.csv,new.csv\n",
        )
        .unwrap();

        let config = CompareConfig::new().with_absolute_tolerance(0.1);
        let output = root.join("results.csv");
        let records = run_batch(&pairs, &output, &config).unwrap();

        let categories: Vec<Category> = records.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Identical,
                Category::DataDiffWithinTolerance,
                Category::StructureDiffEntirely,
                Category::Identical,
            ]
        );
        assert!(records[2].summary.starts_with("Malformed table"));

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 5);
        assert!(written.contains("ref.rtf,new.rtf,data_diff_within_tolerance,true,"));
    }
}
