//! Pipeline module - feature selection, transforms and persisted state

pub mod error;
pub mod loader;
pub mod processor;
pub mod removers;
pub mod settings;
pub mod transforms;

pub use error::ProcessorError;
pub use loader::*;
pub use processor::{FeaturePartition, FeatureSelectionPipeline};
pub use removers::{
    AlmostConstantFeatureRemover, CorrelatedFeatureRemover, CorrelationMatrix, FeatureRemover,
    MatrixMode,
};
pub use settings::{RunIdSource, SettingsRecord, SettingsStore, SystemClock};
pub use transforms::{FeatureTransform, LogRescaler};
