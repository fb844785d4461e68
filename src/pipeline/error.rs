//! Error types for the feature selection pipeline.
//!
//! Every variant here is a configuration or usage error the operator must
//! fix; the pipeline never catches and retries any of them. I/O and polars
//! failures are propagated separately through `anyhow` with context.

use thiserror::Error;

/// Errors raised by the pipeline, removers and transforms.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// A feature partition name outside {all, selected, removed} was
    /// requested, and it is not an `_`-joined union of those either.
    #[error("unknown feature partition '{name}' (expected 'all', 'selected', 'removed' or an '_'-joined union)")]
    UnknownPartition { name: String },

    /// A requested candidate column is absent from a reused artifact,
    /// e.g. a correlation matrix persisted by an earlier run.
    #[error("column '{column}' not found in {artifact}")]
    MissingColumn { column: String, artifact: String },

    /// Frequency-based removal was attempted on a zero-row table.
    #[error("cannot fit on an empty table (zero rows)")]
    EmptyInput,

    /// `transform` was invoked before `fit` on a fit/transform-separated
    /// component.
    #[error("{component} has not been fitted yet")]
    NotFitted { component: &'static str },

    /// A persisted feature list references a column no longer present in
    /// the current dataset. Raised on warm-start instead of silently
    /// carrying the stale name forward.
    #[error("persisted feature '{column}' is not present in the current dataset")]
    StaleFeature { column: String },
}
