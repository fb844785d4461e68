//! Report module - terminal summaries of a selection run

pub mod summary;

pub use summary::SelectionSummary;
