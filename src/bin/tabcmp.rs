//! tabcmp CLI - Clinical report table comparison

#[cfg(feature = "cli")]
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::io::{self, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::process::ExitCode;
#[cfg(feature = "cli")]
use tabcmp::{
    compare_files, extract_path, read_config, run_batch, Category, CompareConfig,
    ComparisonResult, OutputProfile,
};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "tabcmp")]
#[command(version)]
#[command(about = "Compare clinical report tables and classify their differences", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Compare the tables of two documents
    Compare {
        /// Reference document (.rtf, .csv or .tsv)
        left: PathBuf,

        /// Document under test
        right: PathBuf,

        #[command(flatten)]
        options: CompareArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// List every differing cell
        #[arg(long)]
        diffs: bool,

        /// Strict mode: exit with status 1 unless the tables are identical
        #[arg(long)]
        strict: bool,
    },

    /// Compare every pair listed in a CSV file
    Batch {
        /// CSV with left_path,right_path columns
        #[arg(short, long)]
        input: PathBuf,

        /// Results CSV to write
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        options: CompareArgs,
    },

    /// Print the resolved grid of every table in a document as CSV
    Extract {
        /// Input document
        input: PathBuf,
    },

    /// Show version and feature info
    Info,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct CompareArgs {
    /// TOML file with comparison options; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Absolute numeric tolerance
    #[arg(long)]
    abs_tol: Option<f64>,

    /// Relative numeric tolerance
    #[arg(long)]
    rel_tol: Option<f64>,

    /// Coverage at or above which row/column changes are listed one by one
    #[arg(long)]
    minor_threshold: Option<f64>,

    /// Coverage below which two tables are unrelated
    #[arg(long)]
    related_threshold: Option<f64>,

    /// Column holding row labels
    #[arg(long)]
    label_column: Option<usize>,

    /// Number of header rows (auto-detected when omitted)
    #[arg(long)]
    header_rows: Option<usize>,

    /// Classifier output profile
    #[arg(long, value_enum)]
    profile: Option<Profile>,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    /// Six-category taxonomy
    Taxonomy,
    /// Match / no-match, ignoring numeric and style differences
    Binary,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable text
    Text,
    /// JSON document
    Json,
}

#[cfg(feature = "cli")]
impl CompareArgs {
    /// File values, then flags on top, validated once
    fn resolve(&self) -> Result<CompareConfig, String> {
        let mut config = match &self.config {
            Some(path) => read_config(path).map_err(|e| format!("{}: {}", path.display(), e))?,
            None => CompareConfig::default(),
        };

        if let Some(value) = self.abs_tol {
            config.absolute_tolerance = value;
        }
        if let Some(value) = self.rel_tol {
            config.relative_tolerance = value;
        }
        if let Some(value) = self.minor_threshold {
            config.minor_structural_threshold = value;
        }
        if let Some(value) = self.related_threshold {
            config.related_structural_threshold = value;
        }
        if let Some(value) = self.label_column {
            config.label_column_index = value;
        }
        if self.header_rows.is_some() {
            config.header_row_count = self.header_rows;
        }
        if let Some(profile) = self.profile {
            config.profile = match profile {
                Profile::Taxonomy => OutputProfile::Taxonomy,
                Profile::Binary => OutputProfile::Binary,
            };
        }

        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "tabcmp=warn",
        1 => "tabcmp=info",
        2 => "tabcmp=debug",
        _ => "tabcmp=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match handle_command(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::from(2)
        }
    }
}

#[cfg(feature = "cli")]
fn handle_command(cmd: Commands) -> Result<ExitCode, String> {
    match cmd {
        Commands::Compare {
            left,
            right,
            options,
            format,
            diffs,
            strict,
        } => {
            let config = options.resolve()?;
            let result = compare_files(&left, &right, &config).map_err(|e| e.to_string())?;

            match format {
                Format::Json => {
                    let json = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
                    println!("{}", json);
                }
                Format::Text => print_result(&result, diffs).map_err(|e| e.to_string())?,
            }

            if strict && !result.is_identical() {
                return Ok(ExitCode::from(1));
            }
        }

        Commands::Batch {
            input,
            output,
            options,
        } => {
            let config = options.resolve()?;
            let records = run_batch(&input, &output, &config).map_err(|e| e.to_string())?;

            let identical = records
                .iter()
                .filter(|r| r.category == Category::Identical)
                .count();
            eprintln!(
                "✓ {} pair(s) compared, {} identical; results written to: {}",
                records.len(),
                identical,
                output.display()
            );
        }

        Commands::Extract { input } => {
            extract_grids(&input).map_err(|e| e.to_string())?;
        }

        Commands::Info => {
            println!("tabcmp - Clinical report table comparison");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Inputs:");
            println!("  ✓ RTF (merged cells, header rows, bold/italic/underline, alignment)");
            println!("  ✓ CSV / TSV (first row is the header)");
            println!();
            println!("Categories (best to worst):");
            for category in Category::ALL {
                println!("  - {}", category);
            }
            println!();
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "cli")]
fn print_result(result: &ComparisonResult, show_diffs: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "category:   {}", result.category)?;
    writeln!(out, "matches:    {}", result.matches)?;
    writeln!(out, "structure:  {}", result.structural_severity.as_str())?;
    writeln!(out, "data:       {}", result.data_severity.as_str())?;
    writeln!(out, "style:      {}", result.style_differs)?;
    writeln!(out, "summary:    {}", result.summary)?;

    if show_diffs {
        for table in &result.tables {
            for reason in &table.structural.reasons {
                writeln!(out, "  [table {}] {}", table.index, reason)?;
            }
            for diff in &table.content.diffs {
                writeln!(
                    out,
                    "  [table {}] {:?}: {}",
                    table.index,
                    diff.cause,
                    diff.describe()
                )?;
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn extract_grids(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let tables = extract_path(input)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (index, table) in tables.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        writeln!(
            out,
            "# table {}: {} rows x {} columns, {} header row(s){}",
            index,
            table.row_count(),
            table.column_count(),
            table.header_row_count(),
            table
                .caption()
                .map(|c| format!(", caption: {}", c))
                .unwrap_or_default()
        )?;

        let mut writer = csv::Writer::from_writer(&mut out);
        for row in table.to_text_grid() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }

    Ok(())
}


#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install tabcmp --features cli");
    eprintln!("  tabcmp compare [OPTIONS] <LEFT> <RIGHT>");
}
