//! Chaff: Feature Selection Library
//!
//! A library for selecting feature columns in tabular datasets using
//! correlation-based and near-constant-based removal, log-rescaling the
//! survivors, and persisting the resulting feature lists so a later
//! process can reproduce the same feature set deterministically.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
