//! Shared utilities

pub mod progress;

pub use progress::*;
