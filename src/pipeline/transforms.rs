//! In-place numeric transforms over selected feature columns
//!
//! Transforms honor a strict fit/apply separation: `fit` derives parameters
//! from the data it sees, `transform` reuses those parameters without
//! re-deriving them. Calling `transform` before `fit` is an error.

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::pipeline::error::ProcessorError;

/// A per-column fit/transform estimator applied to kept feature columns.
pub trait FeatureTransform {
    /// Derive transform parameters from the candidate columns of `df`.
    fn fit(&mut self, df: &DataFrame, candidates: &[String]) -> Result<()>;

    /// Apply previously fitted parameters, mutating `df` in place.
    fn transform(&self, df: &mut DataFrame) -> Result<()>;

    /// Human-readable transform name for the settings record.
    fn name(&self) -> &'static str;

    /// Human-readable parameter description for the settings record.
    fn params(&self) -> String;

    /// True once `fit` has completed successfully.
    fn is_fitted(&self) -> bool;

    /// Columns the last `fit` selected for transformation.
    fn fitted_columns(&self) -> &[String] {
        &[]
    }
}

/// Log-compresses columns whose dynamic range warrants it.
///
/// A column is selected at fit time iff its minimum is exactly zero and its
/// maximum exceeds the threshold, or its minimum is non-zero and
/// `|max / min|` exceeds the threshold. Transform replaces every value `v`
/// with `ln(1 + v - min)`, where `min` is the minimum recorded at fit time,
/// so the smallest fitted value maps to exactly 0. Values below the fitted
/// minimum (data never seen at fit time) may produce negative or undefined
/// results; that is accepted behavior, not guarded.
pub struct LogRescaler {
    threshold: f64,
    columns: Vec<String>,
    min_vals: Vec<f64>,
    fitted: bool,
}

impl LogRescaler {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            columns: Vec::new(),
            min_vals: Vec::new(),
            fitted: false,
        }
    }

    /// Names of the columns selected for log-compression by the last fit.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Per-selected-column minimums used as shifts, parallel to
    /// [`LogRescaler::column_names`].
    pub fn min_vals(&self) -> &[f64] {
        &self.min_vals
    }

    fn reset(&mut self) {
        self.columns.clear();
        self.min_vals.clear();
        self.fitted = false;
    }
}

impl Default for LogRescaler {
    fn default() -> Self {
        Self::new(1e5)
    }
}

impl FeatureTransform for LogRescaler {
    fn fit(&mut self, df: &DataFrame, candidates: &[String]) -> Result<()> {
        self.reset();

        for name in candidates {
            let column = df
                .column(name)
                .with_context(|| format!("Candidate column '{}' not found in table", name))?;

            // Non-numeric columns are never log-compressed
            if !column.dtype().is_primitive_numeric() {
                continue;
            }

            let column = column.cast(&DataType::Float64)?;
            let ca = column.f64()?;

            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            let mut seen = false;
            for v in ca.into_iter().flatten() {
                seen = true;
                if v < min {
                    min = v;
                }
                if v > max {
                    max = v;
                }
            }
            if !seen {
                continue;
            }

            let selected = if min == 0.0 {
                max > self.threshold
            } else {
                (max / min).abs() > self.threshold
            };

            if selected {
                self.columns.push(name.clone());
                self.min_vals.push(min);
            }
        }

        self.fitted = true;
        Ok(())
    }

    fn transform(&self, df: &mut DataFrame) -> Result<()> {
        if !self.fitted {
            return Err(ProcessorError::NotFitted {
                component: "LogRescaler",
            }
            .into());
        }

        for (name, &shift) in self.columns.iter().zip(self.min_vals.iter()) {
            let column = df
                .column(name)
                .with_context(|| format!("Fitted column '{}' not found in table", name))?;
            let column = column.cast(&DataType::Float64)?;
            let ca = column.f64()?;

            let rescaled = ca.apply_values(|v| (1.0 + v - shift).ln());
            df.with_column(rescaled.into_series())?;
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogRescaler"
    }

    fn params(&self) -> String {
        format!("threshold={}", self.threshold)
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fitted_columns(&self) -> &[String] {
        &self.columns
    }
}
