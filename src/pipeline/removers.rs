//! Feature removers: partition candidate columns into kept vs. removed
//!
//! Each remover consumes a DataFrame and a candidate column list and returns
//! a `(kept, removed)` partition of that list. `fit` always resets derived
//! state first, so re-fitting an instance never accumulates columns from a
//! previous candidate list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pipeline::error::ProcessorError;

/// A pluggable removability criterion over candidate feature columns.
///
/// `fit` derives the partition from the data; the accessor methods expose
/// the fitted state afterwards. `kept` preserves the candidate order and
/// `kept ∪ removed` equals the candidate list.
pub trait FeatureRemover {
    /// Partition `candidates` into `(kept, removed)` based on `df`.
    fn fit(&mut self, df: &DataFrame, candidates: &[String]) -> Result<(Vec<String>, Vec<String>)>;

    /// Human-readable remover name for the settings record.
    fn name(&self) -> &'static str;

    /// Human-readable parameter description for the settings record.
    fn params(&self) -> String;

    /// Columns the last `fit` decided to keep.
    fn columns_to_leave(&self) -> &[String];

    /// Columns the last `fit` decided to remove.
    fn columns_to_remove(&self) -> &[String];

    /// True once `fit` has completed successfully.
    fn is_fitted(&self) -> bool;

    /// True when the remover caches its decision artifacts for reuse
    /// across runs.
    fn is_persistent(&self) -> bool {
        false
    }
}

/// Serialized form of a correlation matrix. `None` entries encode undefined
/// correlations (constant or non-numeric columns), since JSON has no NaN.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CorrelationMatrixFile {
    columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

/// Pairwise Pearson correlation matrix over a set of named columns.
///
/// Columns that are non-numeric, constant, or have fewer than two non-null
/// values get NaN rows/columns; NaN never exceeds a removal threshold.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    values: Mat<f64>,
}

impl CorrelationMatrix {
    /// Compute the correlation matrix for `candidates` in candidate order.
    ///
    /// Algorithm: standardize each column to zero mean and unit norm
    /// (nulls contribute zero), then take R = Z^T * Z. Standardization runs
    /// in parallel across columns via Rayon.
    pub fn compute(df: &DataFrame, candidates: &[String]) -> Result<Self> {
        let n_rows = df.height();
        let n_cols = candidates.len();

        let standardized: Vec<Option<Vec<f64>>> = candidates
            .par_iter()
            .map(|name| standardize_column(df, name))
            .collect::<Result<_>>()?;

        let mut z = Mat::<f64>::zeros(n_rows, n_cols);
        for (col_idx, col) in standardized.iter().enumerate() {
            if let Some(vals) = col {
                for (row_idx, &val) in vals.iter().enumerate() {
                    z[(row_idx, col_idx)] = val;
                }
            }
        }

        let product = z.transpose() * &z;

        let mut values = Mat::<f64>::zeros(n_cols, n_cols);
        for i in 0..n_cols {
            for j in 0..n_cols {
                values[(i, j)] = if standardized[i].is_none() || standardized[j].is_none() {
                    f64::NAN
                } else if i == j {
                    1.0
                } else {
                    product[(i, j)]
                };
            }
        }

        Ok(Self {
            columns: candidates.to_vec(),
            values,
        })
    }

    /// Number of columns covered by the matrix.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in matrix order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column name in the matrix, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Correlation between columns `i` and `j` (NaN when undefined).
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Serialize the matrix as JSON so a later run can reuse it.
    pub fn write(&self, path: &Path) -> Result<()> {
        let n = self.columns.len();
        let values: Vec<Vec<Option<f64>>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        let v = self.values[(i, j)];
                        if v.is_nan() {
                            None
                        } else {
                            Some(v)
                        }
                    })
                    .collect()
            })
            .collect();

        let file = CorrelationMatrixFile {
            columns: self.columns.clone(),
            values,
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write correlation matrix: {}", path.display()))?;
        Ok(())
    }

    /// Load a matrix previously serialized with [`CorrelationMatrix::write`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read correlation matrix: {}", path.display()))?;
        let file: CorrelationMatrixFile = serde_json::from_str(&json)
            .with_context(|| format!("Malformed correlation matrix: {}", path.display()))?;

        let n = file.columns.len();
        if file.values.len() != n || file.values.iter().any(|row| row.len() != n) {
            anyhow::bail!(
                "Correlation matrix {} has inconsistent dimensions",
                path.display()
            );
        }

        let mut values = Mat::<f64>::zeros(n, n);
        for (i, row) in file.values.iter().enumerate() {
            for (j, entry) in row.iter().enumerate() {
                values[(i, j)] = entry.unwrap_or(f64::NAN);
            }
        }

        Ok(Self {
            columns: file.columns,
            values,
        })
    }
}

/// Standardize a column to zero mean and unit norm for the Z^T * Z product.
///
/// Returns `None` for columns whose correlation is undefined: non-numeric
/// dtype, fewer than two non-null values, or zero variance.
fn standardize_column(df: &DataFrame, name: &str) -> Result<Option<Vec<f64>>> {
    let col = df
        .column(name)
        .with_context(|| format!("Candidate column '{}' not found in table", name))?;

    if !col.dtype().is_primitive_numeric() {
        return Ok(None);
    }

    let col = col.cast(&DataType::Float64)?;
    let ca = col.f64()?;

    let mut sum = 0.0;
    let mut n_valid = 0usize;
    for v in ca.into_iter().flatten() {
        sum += v;
        n_valid += 1;
    }
    if n_valid < 2 {
        return Ok(None);
    }
    let mean = sum / n_valid as f64;

    let mut sum_sq_dev = 0.0;
    for v in ca.into_iter().flatten() {
        let dev = v - mean;
        sum_sq_dev += dev * dev;
    }
    let std = (sum_sq_dev / n_valid as f64).sqrt();
    if std == 0.0 {
        return Ok(None);
    }

    // Pre-divide by sqrt(n) so Z^T * Z yields correlation directly
    let scale = 1.0 / (std * (n_valid as f64).sqrt());
    let standardized: Vec<f64> = ca
        .into_iter()
        .map(|v| match v {
            Some(x) => (x - mean) * scale,
            None => 0.0,
        })
        .collect();

    Ok(Some(standardized))
}

/// Strict upper-triangular scan: mark column `j` for removal when any
/// earlier column `i < j` correlates with it above the threshold. Earlier
/// columns that are themselves removed still disqualify later ones, which
/// encodes the "keep the earlier-declared member of any pair" tie-break.
fn scan_upper_triangle<F>(n: usize, threshold: f64, corr: F) -> Vec<bool>
where
    F: Fn(usize, usize) -> f64,
{
    let mut to_remove = vec![false; n];
    for j in 1..n {
        for i in 0..j {
            // NaN fails the comparison, so undefined correlations never remove
            if corr(i, j).abs() > threshold {
                to_remove[j] = true;
                break;
            }
        }
    }
    to_remove
}

/// How a [`CorrelatedFeatureRemover`] obtains its correlation matrix.
/// Write and Load are mutually exclusive per invocation by construction.
#[derive(Debug, Clone)]
pub enum MatrixMode {
    /// Compute the matrix from the table and discard it afterwards.
    Compute,
    /// Compute the matrix, then serialize it to the path before the scan.
    Write(PathBuf),
    /// Reuse a previously serialized matrix instead of recomputing.
    Load(PathBuf),
}

/// Removes the later member of every candidate pair whose absolute
/// correlation exceeds the configured threshold.
pub struct CorrelatedFeatureRemover {
    correlation_threshold: f64,
    matrix_mode: MatrixMode,
    verbose: bool,
    columns_to_remove: Vec<String>,
    columns_to_leave: Vec<String>,
    fitted: bool,
}

impl CorrelatedFeatureRemover {
    pub fn new(correlation_threshold: f64) -> Self {
        Self {
            correlation_threshold,
            matrix_mode: MatrixMode::Compute,
            verbose: false,
            columns_to_remove: Vec::new(),
            columns_to_leave: Vec::new(),
            fitted: false,
        }
    }

    /// Persist the computed matrix to `path` so a later run can reuse it.
    pub fn with_matrix_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.matrix_mode = MatrixMode::Write(path.into());
        self
    }

    /// Load the matrix from `path` instead of computing it. The removal
    /// decision is then frozen at the time the matrix was written.
    pub fn with_matrix_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.matrix_mode = MatrixMode::Load(path.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn reset(&mut self) {
        self.columns_to_remove.clear();
        self.columns_to_leave.clear();
        self.fitted = false;
    }
}

impl FeatureRemover for CorrelatedFeatureRemover {
    fn fit(&mut self, df: &DataFrame, candidates: &[String]) -> Result<(Vec<String>, Vec<String>)> {
        self.reset();

        let to_remove = match &self.matrix_mode {
            MatrixMode::Compute => {
                let matrix = CorrelationMatrix::compute(df, candidates)?;
                scan_upper_triangle(candidates.len(), self.correlation_threshold, |i, j| {
                    matrix.value(i, j)
                })
            }
            MatrixMode::Write(path) => {
                let matrix = CorrelationMatrix::compute(df, candidates)?;
                matrix.write(path)?;
                scan_upper_triangle(candidates.len(), self.correlation_threshold, |i, j| {
                    matrix.value(i, j)
                })
            }
            MatrixMode::Load(path) => {
                let matrix = CorrelationMatrix::load(path)?;
                let indices: Vec<usize> = candidates
                    .iter()
                    .map(|name| {
                        matrix
                            .index_of(name)
                            .ok_or_else(|| ProcessorError::MissingColumn {
                                column: name.clone(),
                                artifact: format!(
                                    "persisted correlation matrix {}",
                                    path.display()
                                ),
                            })
                    })
                    .collect::<Result<_, _>>()?;
                scan_upper_triangle(candidates.len(), self.correlation_threshold, |i, j| {
                    matrix.value(indices[i], indices[j])
                })
            }
        };

        for (name, removed) in candidates.iter().zip(to_remove.iter()) {
            if *removed {
                self.columns_to_remove.push(name.clone());
            } else {
                self.columns_to_leave.push(name.clone());
            }
        }
        self.fitted = true;

        if self.verbose {
            println!(
                "{} features found with a correlation higher than {}",
                self.columns_to_remove.len(),
                self.correlation_threshold
            );
        }

        Ok((self.columns_to_leave.clone(), self.columns_to_remove.clone()))
    }

    fn name(&self) -> &'static str {
        "CorrelatedFeatureRemover"
    }

    fn params(&self) -> String {
        match &self.matrix_mode {
            MatrixMode::Compute => format!("correlation_threshold={}", self.correlation_threshold),
            MatrixMode::Write(path) => format!(
                "correlation_threshold={}, matrix_output={}",
                self.correlation_threshold,
                path.display()
            ),
            MatrixMode::Load(path) => format!(
                "correlation_threshold={}, matrix_input={}",
                self.correlation_threshold,
                path.display()
            ),
        }
    }

    fn columns_to_leave(&self) -> &[String] {
        &self.columns_to_leave
    }

    fn columns_to_remove(&self) -> &[String] {
        &self.columns_to_remove
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn is_persistent(&self) -> bool {
        matches!(self.matrix_mode, MatrixMode::Write(_) | MatrixMode::Load(_))
    }
}

/// Removes columns dominated by a single value: when the modal value covers
/// strictly more than `max_count_percent` percent of the rows.
pub struct AlmostConstantFeatureRemover {
    max_count_percent: f64,
    verbose: bool,
    columns_to_remove: Vec<String>,
    columns_to_leave: Vec<String>,
    fitted: bool,
}

impl AlmostConstantFeatureRemover {
    pub fn new(max_count_percent: f64) -> Self {
        Self {
            max_count_percent,
            verbose: false,
            columns_to_remove: Vec::new(),
            columns_to_leave: Vec::new(),
            fitted: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn reset(&mut self) {
        self.columns_to_remove.clear();
        self.columns_to_leave.clear();
        self.fitted = false;
    }

    /// Frequency of the most common non-null value, as a percent of rows.
    /// Counted with a single group-by over the column, so values are
    /// compared natively rather than through a string representation.
    fn modal_percent(column: &Column, height: usize) -> Result<f64> {
        let name = column.name().as_str();
        let counts = DataFrame::new(vec![column.clone()])?
            .lazy()
            .filter(col(name).is_not_null())
            .group_by([col(name)])
            .agg([len().alias("count")])
            .collect()?;

        let max_count = counts.column("count")?.u32()?.max().unwrap_or(0);
        Ok(max_count as f64 * 100.0 / height as f64)
    }
}

impl FeatureRemover for AlmostConstantFeatureRemover {
    fn fit(&mut self, df: &DataFrame, candidates: &[String]) -> Result<(Vec<String>, Vec<String>)> {
        self.reset();

        let height = df.height();
        if height == 0 {
            return Err(ProcessorError::EmptyInput.into());
        }

        for name in candidates {
            let column = df
                .column(name)
                .with_context(|| format!("Candidate column '{}' not found in table", name))?;
            let percent = Self::modal_percent(column, height)?;

            if percent > self.max_count_percent {
                self.columns_to_remove.push(name.clone());
            } else {
                self.columns_to_leave.push(name.clone());
            }
        }
        self.fitted = true;

        if self.verbose {
            println!(
                "{} features found with a single value covering more than {}% of rows",
                self.columns_to_remove.len(),
                self.max_count_percent
            );
        }

        Ok((self.columns_to_leave.clone(), self.columns_to_remove.clone()))
    }

    fn name(&self) -> &'static str {
        "AlmostConstantFeatureRemover"
    }

    fn params(&self) -> String {
        format!("max_count_percent={}", self.max_count_percent)
    }

    fn columns_to_leave(&self) -> &[String] {
        &self.columns_to_leave
    }

    fn columns_to_remove(&self) -> &[String] {
        &self.columns_to_remove
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}
