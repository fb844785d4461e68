//! The feature selection pipeline: tracks feature-set membership across
//! removal and transform stages and persists the result for reproduction.

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use polars::prelude::*;

use crate::pipeline::error::ProcessorError;
use crate::pipeline::removers::FeatureRemover;
use crate::pipeline::settings::{RunIdSource, SettingsRecord, SettingsStore, SystemClock};
use crate::pipeline::transforms::FeatureTransform;

/// The evolving partition of feature columns.
///
/// `all` is fixed at construction from the input table's columns minus the
/// declared non-feature columns. `selected` and `removed` are disjoint
/// subsets of `all`, fully recomputed by every
/// [`FeatureSelectionPipeline::fit_remove`] run; `removed` is deduplicated
/// and its order is not significant.
#[derive(Debug, Clone, Default)]
pub struct FeaturePartition {
    pub all: Vec<String>,
    pub selected: Vec<String>,
    pub removed: Vec<String>,
}

/// Orchestrates an ordered list of removers and transforms over a dataset
/// and persists the resulting feature lists and pipeline description.
///
/// Construction ensures the on-disk layout exists and, when a settings
/// record from a previous run is present, warm-starts the partition from
/// the persisted list files. Loaded names are validated against the current
/// `all` set; a stale name is an error rather than silently carried forward.
pub struct FeatureSelectionPipeline {
    store: SettingsStore,
    features: FeaturePartition,
    removers: Vec<Box<dyn FeatureRemover>>,
    transforms: Vec<Box<dyn FeatureTransform>>,
    run_ids: Box<dyn RunIdSource>,
    prefix: Option<String>,
    verbose: bool,
    saved: bool,
    last_run_id: Option<String>,
}

impl std::fmt::Debug for FeatureSelectionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureSelectionPipeline")
            .field("features", &self.features)
            .field("removers", &self.removers.len())
            .field("transforms", &self.transforms.len())
            .field("prefix", &self.prefix)
            .field("verbose", &self.verbose)
            .field("saved", &self.saved)
            .field("last_run_id", &self.last_run_id)
            .finish_non_exhaustive()
    }
}

impl FeatureSelectionPipeline {
    /// Create a pipeline rooted at `root`, enumerating feature columns from
    /// `df` minus `non_feature_columns` (labels, identifiers and the like).
    pub fn new(
        root: impl Into<PathBuf>,
        df: &DataFrame,
        non_feature_columns: &[String],
    ) -> Result<Self> {
        let store = SettingsStore::open(root)?;

        let all: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| !non_feature_columns.contains(name))
            .collect();

        let mut features = FeaturePartition {
            all,
            selected: Vec::new(),
            removed: Vec::new(),
        };

        // Warm start: resume the partition persisted by the last run
        if store.has_settings() {
            let record = store.read_settings()?;
            let selected = store.read_feature_list(&record.selected_list)?;
            let removed = store.read_feature_list(&record.removed_list)?;

            for name in selected.iter().chain(removed.iter()) {
                if !features.all.contains(name) {
                    return Err(ProcessorError::StaleFeature {
                        column: name.clone(),
                    }
                    .into());
                }
            }

            features.selected = selected;
            features.removed = removed;
        }

        Ok(Self {
            store,
            features,
            removers: Vec::new(),
            transforms: Vec::new(),
            run_ids: Box::new(SystemClock),
            prefix: None,
            verbose: false,
            saved: false,
            last_run_id: None,
        })
    }

    /// Prefix prepended to every minted run identifier.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replace the run identifier source; tests inject a fixed source to
    /// keep artifact names deterministic.
    pub fn with_run_id_source(mut self, source: Box<dyn RunIdSource>) -> Self {
        self.run_ids = source;
        self
    }

    /// The current feature partition.
    pub fn features(&self) -> &FeaturePartition {
        &self.features
    }

    /// The store owning this pipeline's on-disk artifacts.
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Run identifier minted by the most recent `save`, if any.
    pub fn last_run_id(&self) -> Option<&str> {
        self.last_run_id.as_deref()
    }

    /// Removers registered so far, in registration order.
    pub fn removers(&self) -> &[Box<dyn FeatureRemover>] {
        &self.removers
    }

    /// Transforms registered so far, in registration order.
    pub fn transforms(&self) -> &[Box<dyn FeatureTransform>] {
        &self.transforms
    }

    /// Return a named partition: `all`, `selected`, `removed`, or an
    /// `_`-joined union of those (deduplicated, e.g. `selected_removed`).
    pub fn return_features_list(&self, which: &str) -> Result<Vec<String>> {
        let lookup = |part: &str| -> Option<&Vec<String>> {
            match part {
                "all" => Some(&self.features.all),
                "selected" => Some(&self.features.selected),
                "removed" => Some(&self.features.removed),
                _ => None,
            }
        };

        if let Some(list) = lookup(which) {
            return Ok(list.clone());
        }

        if which.contains('_') {
            let mut union: Vec<String> = Vec::new();
            for part in which.split('_') {
                let list = lookup(part).ok_or_else(|| ProcessorError::UnknownPartition {
                    name: which.to_string(),
                })?;
                for name in list {
                    if !union.contains(name) {
                        union.push(name.clone());
                    }
                }
            }
            return Ok(union);
        }

        Err(ProcessorError::UnknownPartition {
            name: which.to_string(),
        }
        .into())
    }

    /// Append a remover to the ordered remover list. Pure mutation, no I/O.
    pub fn add_remover(&mut self, remover: Box<dyn FeatureRemover>) -> &mut Self {
        self.removers.push(remover);
        self
    }

    /// Append a transform to the ordered transform list.
    pub fn add_transform(&mut self, transform: Box<dyn FeatureTransform>) -> &mut Self {
        self.transforms.push(transform);
        self
    }

    /// Run every registered remover in registration order, each consuming
    /// the current survivor set. Fully overwrites any prior partition
    /// state; with no removers registered, all features are selected.
    pub fn fit_remove(&mut self, df: &DataFrame) -> Result<(Vec<String>, Vec<String>)> {
        let mut candidates = self.features.all.clone();
        let mut removed: Vec<String> = Vec::new();

        for remover in &mut self.removers {
            if self.verbose {
                println!(
                    "    {} {}",
                    style("→").cyan(),
                    style(remover.name()).white().bold()
                );
            }
            let (kept, rejected) = remover.fit(df, &candidates)?;
            for name in rejected {
                if !removed.contains(&name) {
                    removed.push(name);
                }
            }
            candidates = kept;
        }

        self.features.selected = candidates;
        self.features.removed = removed;

        Ok((
            self.features.selected.clone(),
            self.features.removed.clone(),
        ))
    }

    /// Fit and apply every registered transform, in order, over the
    /// `selected` columns of `df`, mutating it in place.
    pub fn fit_transform(&mut self, df: &mut DataFrame) -> Result<()> {
        let columns = self.features.selected.clone();
        for transform in &mut self.transforms {
            transform.fit(df, &columns)?;
            transform.transform(df)?;
        }
        Ok(())
    }

    /// Apply every registered transform using previously fitted parameters.
    /// A no-op with an empty transform list; an unfitted transform fails.
    pub fn transform(&self, df: &mut DataFrame) -> Result<()> {
        for transform in &self.transforms {
            transform.transform(df)?;
        }
        Ok(())
    }

    /// Persist the partition and pipeline description under a freshly
    /// minted run identifier, rotating the previous settings record.
    pub fn save(&mut self) -> Result<String> {
        let run_id = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, self.run_ids.mint()),
            None => self.run_ids.mint(),
        };

        let (removed_rel, selected_rel) = self.store.write_feature_lists(
            &run_id,
            &self.features.removed,
            &self.features.selected,
        )?;

        let record = SettingsRecord {
            removed_list: removed_rel,
            selected_list: selected_rel,
            removers: self.removers.iter().map(|r| r.name().to_string()).collect(),
            remover_params: self.removers.iter().map(|r| r.params()).collect(),
            fname: run_id.clone(),
        };
        self.store.write_settings(&record)?;

        self.saved = true;
        self.last_run_id = Some(run_id.clone());

        if self.verbose {
            println!(
                "    {} Saved pipeline state as run {}",
                style("✓").green().bold(),
                style(&run_id).yellow()
            );
        }

        Ok(run_id)
    }

    /// Log cross-validation bookkeeping to the append-only CV log: the
    /// model description, the pipeline description and artifact paths, and
    /// mean/std per supplied scorer. Triggers `save` first if the pipeline
    /// state has not been persisted yet. Score values are computed by the
    /// caller's predictor and scorers; this call only records them.
    pub fn cv(&mut self, model_description: &str, scores: &[(String, Vec<f64>)]) -> Result<()> {
        if !self.saved {
            self.save()?;
        }
        let run_id = self.last_run_id.clone().unwrap_or_default();

        let mut entry = String::new();
        entry.push_str(&format!("run: {}\n", run_id));
        entry.push_str(&format!("model: {}\n", model_description));
        for remover in &self.removers {
            entry.push_str(&format!(
                "remover: {} ({})\n",
                remover.name(),
                remover.params()
            ));
        }
        for transform in &self.transforms {
            entry.push_str(&format!(
                "transform: {} ({})\n",
                transform.name(),
                transform.params()
            ));
        }
        entry.push_str(&format!(
            "settings: {}\n",
            self.store.settings_path().display()
        ));
        for (scorer, values) in scores {
            let (mean, std) = mean_std(values);
            entry.push_str(&format!("{}: mean={:.6} std={:.6}\n", scorer, mean, std));
        }
        entry.push('\n');

        self.store.append_cv_log(&entry)
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
