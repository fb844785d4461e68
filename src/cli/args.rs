//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

/// Chaff - select features with correlation and near-constant analysis,
/// log-rescale wide-range columns, and persist the run for reproduction
#[derive(Parser, Debug)]
#[command(name = "chaff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Root directory for persisted pipeline state.
    /// Defaults to the input file's directory.
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Non-feature columns excluded from analysis (comma-separated),
    /// e.g. labels and identifiers.
    #[arg(short, long, value_delimiter = ',')]
    pub non_feature_columns: Vec<String>,

    /// Correlation threshold - drop the later feature of pairs with
    /// absolute correlation above this value
    #[arg(long, default_value = "0.95")]
    pub correlation_threshold: f64,

    /// Almost-constant threshold - drop features whose most common value
    /// covers strictly more than this percentage of rows
    #[arg(long, default_value = "99.0")]
    pub max_count_percent: f64,

    /// Log-rescale threshold - compress columns whose max/min ratio
    /// (or max, for zero-minimum columns) exceeds this value
    #[arg(long, default_value = "1e5")]
    pub log_threshold: f64,

    /// Persist the computed correlation matrix to this path for reuse
    #[arg(long)]
    pub matrix_output: Option<PathBuf>,

    /// Reuse a previously persisted correlation matrix instead of
    /// recomputing (mutually exclusive with --matrix-output)
    #[arg(long, conflicts_with = "matrix_output")]
    pub matrix_input: Option<PathBuf>,

    /// Prefix prepended to the generated run identifier
    #[arg(long)]
    pub prefix: Option<String>,

    /// Write the transformed dataset (selected columns rescaled in place)
    /// to this path (CSV or Parquet by extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print per-stage progress counts
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

impl Cli {
    /// Pipeline root, derived from the input directory when not provided.
    pub fn root_path(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            self.input
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .to_path_buf()
        })
    }
}
