//! Durable pipeline state: settings records, feature lists and run ids
//!
//! The store owns the on-disk layout under a caller-supplied root:
//!
//! ```text
//! <root>/dataprocessor_files/features/removed/<run_id>
//! <root>/dataprocessor_files/features/selected/<run_id>
//! <root>/dataprocessor_files/settings/current_settings.log
//! <root>/dataprocessor_files/settings/old_settings_<run_id>.log
//! <root>/dataprocessor_files/output/cv/cv.log
//! <root>/dataprocessor_files/output/predictions/
//! ```
//!
//! The settings record at a given root is a single-writer resource; callers
//! must serialize saves per root.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

const FILES_DIR: &str = "dataprocessor_files";
const CURRENT_SETTINGS: &str = "current_settings.log";
const CV_LOG: &str = "cv.log";

/// Mints run identifiers: filesystem-safe tokens unique per save within
/// practical time resolution. Injectable so tests can pin a fixed id.
pub trait RunIdSource {
    fn mint(&self) -> String;
}

/// Default run id source: local timestamp with colons and spaces replaced.
pub struct SystemClock;

impl RunIdSource for SystemClock {
    fn mint(&self) -> String {
        Local::now().format("%m-%d_%H_%M_%S").to_string()
    }
}

/// The durable JSON description of the most recent persisted pipeline run.
///
/// Key names are fixed on disk; unknown or missing fields on load are
/// errors rather than silently defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsRecord {
    #[serde(rename = "features removed list")]
    pub removed_list: String,
    #[serde(rename = "features selected list")]
    pub selected_list: String,
    pub removers: Vec<String>,
    pub remover_params: Vec<String>,
    pub fname: String,
}

/// Durable settings file plus plain-text column-list files, with versioned
/// rotation of the previous settings record.
pub struct SettingsStore {
    root: PathBuf,
}

impl SettingsStore {
    /// Open a store at `root`, creating the directory layout if missing.
    /// Idempotent; a root that cannot be created is fatal.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let store = Self { root };
        for dir in [
            store.removed_dir(),
            store.selected_dir(),
            store.settings_dir(),
            store.cv_dir(),
            store.predictions_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn removed_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR).join("features").join("removed")
    }

    fn selected_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR).join("features").join("selected")
    }

    fn settings_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR).join("settings")
    }

    fn cv_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR).join("output").join("cv")
    }

    fn predictions_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR).join("output").join("predictions")
    }

    /// Path of the current settings record.
    pub fn settings_path(&self) -> PathBuf {
        self.settings_dir().join(CURRENT_SETTINGS)
    }

    /// Path of the append-only cross-validation log.
    pub fn cv_log_path(&self) -> PathBuf {
        self.cv_dir().join(CV_LOG)
    }

    /// Whether a settings record from a previous run exists at this root.
    pub fn has_settings(&self) -> bool {
        self.settings_path().is_file()
    }

    /// Read and schema-check the current settings record.
    pub fn read_settings(&self) -> Result<SettingsRecord> {
        let path = self.settings_path();
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings record: {}", path.display()))?;
        let record: SettingsRecord = serde_json::from_str(&json)
            .with_context(|| format!("Malformed settings record: {}", path.display()))?;
        Ok(record)
    }

    /// Read a newline-delimited column-list file by its record-relative path.
    pub fn read_feature_list(&self, relative: &str) -> Result<Vec<String>> {
        let path = self.root.join(relative);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read feature list: {}", path.display()))?;
        Ok(text
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect())
    }

    /// Write the removed and selected lists for a run. Returns the
    /// record-relative paths of the two files.
    pub fn write_feature_lists(
        &self,
        run_id: &str,
        removed: &[String],
        selected: &[String],
    ) -> Result<(String, String)> {
        let removed_path = self.removed_dir().join(run_id);
        let selected_path = self.selected_dir().join(run_id);

        write_feature_list(&removed_path, removed)?;
        write_feature_list(&selected_path, selected)?;

        let removed_rel = format!("{}/features/removed/{}", FILES_DIR, run_id);
        let selected_rel = format!("{}/features/selected/{}", FILES_DIR, run_id);
        Ok((removed_rel, selected_rel))
    }

    /// Write a new settings record, rotating any existing record to an
    /// archival name keyed by its own run identifier. The old record is
    /// never deleted.
    pub fn write_settings(&self, record: &SettingsRecord) -> Result<()> {
        let path = self.settings_path();

        if path.is_file() {
            let previous = self.read_settings()?;
            // A colliding run id must not clobber an earlier archive
            let mut archive = self
                .settings_dir()
                .join(format!("old_settings_{}.log", previous.fname));
            let mut attempt = 1u32;
            while archive.exists() {
                attempt += 1;
                archive = self
                    .settings_dir()
                    .join(format!("old_settings_{}_{}.log", previous.fname, attempt));
            }
            fs::rename(&path, &archive).with_context(|| {
                format!("Failed to rotate settings record to {}", archive.display())
            })?;
        }

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write settings record: {}", path.display()))?;
        Ok(())
    }

    /// Append an entry to the cross-validation log.
    pub fn append_cv_log(&self, entry: &str) -> Result<()> {
        let path = self.cv_log_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open CV log: {}", path.display()))?;
        file.write_all(entry.as_bytes())
            .with_context(|| format!("Failed to append to CV log: {}", path.display()))?;
        Ok(())
    }
}

fn write_feature_list(path: &Path, columns: &[String]) -> Result<()> {
    let mut text = columns.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    fs::write(path, text)
        .with_context(|| format!("Failed to write feature list: {}", path.display()))?;
    Ok(())
}
