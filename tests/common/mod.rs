//! Shared test utilities and fixture generators
#![allow(dead_code)]

use chaff::pipeline::RunIdSource;
use polars::prelude::*;
use tempfile::TempDir;

/// Run id source that always mints the same identifier, keeping artifact
/// names deterministic in tests.
pub struct FixedRunIds(pub String);

impl RunIdSource for FixedRunIds {
    fn mint(&self) -> String {
        self.0.clone()
    }
}

/// Create a temporary pipeline root
pub fn create_temp_root() -> TempDir {
    TempDir::new().unwrap()
}

/// DataFrame with known removal candidates:
/// - `x`: clean feature
/// - `x_p_1`: x plus one, perfectly correlated with x
/// - `x_t_x`: x times x, uncorrelated with x
/// - `const`: single repeated value (100% modal frequency)
pub fn create_removal_test_dataframe() -> DataFrame {
    df! {
        "x" => [-2.0f64, 0.0, 2.0],
        "x_p_1" => [-1.0f64, 1.0, 3.0],
        "x_t_x" => [4.0f64, 0.0, 4.0],
        "const" => [10.0f64, 10.0, 10.0],
    }
    .unwrap()
}

/// DataFrame with known correlation patterns:
/// - `b` is perfectly positively correlated with `a` (b = 2*a)
/// - `c` is perfectly negatively correlated with `a`
/// - `d` is uncorrelated noise
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0],
        "c" => [10.0f64, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        "d" => [5.0f64, 1.0, 8.0, 2.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0],
    }
    .unwrap()
}

/// DataFrame with known log-rescaling candidates: `x` (zero minimum, huge
/// maximum) and `z` (huge max/min ratio) qualify, `y` does not.
pub fn create_log_test_dataframe() -> DataFrame {
    df! {
        "x" => [0.0f64, 1e7],
        "y" => [0.0f64, 9e4],
        "z" => [1e-5f64, 1e2],
    }
    .unwrap()
}

/// Column names as owned strings, in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Owned string vector from string literals
pub fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}
