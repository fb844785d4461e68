//! Tests for the settings store and run id sources

use chaff::pipeline::settings::{RunIdSource, SettingsRecord, SettingsStore, SystemClock};

#[path = "common/mod.rs"]
mod common;

use common::*;

fn sample_record(run_id: &str) -> SettingsRecord {
    SettingsRecord {
        removed_list: format!("dataprocessor_files/features/removed/{}", run_id),
        selected_list: format!("dataprocessor_files/features/selected/{}", run_id),
        removers: names(&["CorrelatedFeatureRemover"]),
        remover_params: names(&["threshold=0.95"]),
        fname: run_id.to_string(),
    }
}

#[test]
fn test_open_creates_layout_and_is_idempotent() {
    let temp = create_temp_root();

    let store = SettingsStore::open(temp.path()).unwrap();
    let files = temp.path().join("dataprocessor_files");
    assert!(files.join("features").join("removed").is_dir());
    assert!(files.join("features").join("selected").is_dir());
    assert!(files.join("settings").is_dir());
    assert!(files.join("output").join("cv").is_dir());
    assert!(files.join("output").join("predictions").is_dir());
    assert!(!store.has_settings());

    // Reopening an existing root succeeds without disturbing it
    store.write_settings(&sample_record("a")).unwrap();
    let reopened = SettingsStore::open(temp.path()).unwrap();
    assert!(reopened.has_settings());
}

#[test]
fn test_settings_record_uses_fixed_key_names() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();
    store.write_settings(&sample_record("keys")).unwrap();

    let json = std::fs::read_to_string(store.settings_path()).unwrap();
    assert!(json.contains("\"features removed list\""));
    assert!(json.contains("\"features selected list\""));
    assert!(json.contains("\"removers\""));
    assert!(json.contains("\"remover_params\""));
    assert!(json.contains("\"fname\""));
}

#[test]
fn test_settings_record_roundtrip() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();

    let record = sample_record("roundtrip");
    store.write_settings(&record).unwrap();
    assert_eq!(store.read_settings().unwrap(), record);
}

#[test]
fn test_malformed_settings_record_fails() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();

    // An unknown key is a schema violation, not something to ignore
    let json = r#"{
        "features removed list": "a",
        "features selected list": "b",
        "removers": [],
        "remover_params": [],
        "fname": "x",
        "surprise": true
    }"#;
    std::fs::write(store.settings_path(), json).unwrap();
    assert!(store.read_settings().is_err());

    // So is a missing key
    let json = r#"{
        "features removed list": "a",
        "removers": [],
        "remover_params": [],
        "fname": "x"
    }"#;
    std::fs::write(store.settings_path(), json).unwrap();
    assert!(store.read_settings().is_err());
}

#[test]
fn test_write_settings_rotates_previous_record() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();

    store.write_settings(&sample_record("first")).unwrap();
    store.write_settings(&sample_record("second")).unwrap();

    let settings_dir = temp.path().join("dataprocessor_files").join("settings");
    let archive = settings_dir.join("old_settings_first.log");
    assert!(archive.is_file(), "previous record is archived, not deleted");

    let archived: SettingsRecord =
        serde_json::from_str(&std::fs::read_to_string(&archive).unwrap()).unwrap();
    assert_eq!(archived.fname, "first");
    assert_eq!(store.read_settings().unwrap().fname, "second");
}

#[test]
fn test_rotation_keeps_archives_with_colliding_run_ids() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();

    // Three saves under the same run id, e.g. within one clock second
    let mut first = sample_record("dup");
    first.remover_params = names(&["threshold=0.5"]);
    store.write_settings(&first).unwrap();
    store.write_settings(&sample_record("dup")).unwrap();
    store.write_settings(&sample_record("dup")).unwrap();

    let settings_dir = temp.path().join("dataprocessor_files").join("settings");
    let archive = settings_dir.join("old_settings_dup.log");
    let second_archive = settings_dir.join("old_settings_dup_2.log");
    assert!(archive.is_file());
    assert!(second_archive.is_file(), "colliding archive gets a suffix");

    // The oldest record is still intact under the unsuffixed name
    let archived: SettingsRecord =
        serde_json::from_str(&std::fs::read_to_string(&archive).unwrap()).unwrap();
    assert_eq!(archived.remover_params, names(&["threshold=0.5"]));
}

#[test]
fn test_feature_list_roundtrip() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();

    let removed = names(&["b", "c"]);
    let selected = names(&["a", "d"]);
    let (removed_rel, selected_rel) = store
        .write_feature_lists("lists", &removed, &selected)
        .unwrap();

    assert_eq!(removed_rel, "dataprocessor_files/features/removed/lists");
    assert_eq!(selected_rel, "dataprocessor_files/features/selected/lists");
    assert_eq!(store.read_feature_list(&removed_rel).unwrap(), removed);
    assert_eq!(store.read_feature_list(&selected_rel).unwrap(), selected);
}

#[test]
fn test_empty_feature_list_roundtrip() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();

    let (removed_rel, _) = store.write_feature_lists("empty", &[], &names(&["a"])).unwrap();
    assert!(store.read_feature_list(&removed_rel).unwrap().is_empty());
}

#[test]
fn test_append_cv_log_accumulates() {
    let temp = create_temp_root();
    let store = SettingsStore::open(temp.path()).unwrap();

    store.append_cv_log("first entry\n").unwrap();
    store.append_cv_log("second entry\n").unwrap();

    let log = std::fs::read_to_string(store.cv_log_path()).unwrap();
    assert_eq!(log, "first entry\nsecond entry\n");
}

#[test]
fn test_system_clock_mints_filesystem_safe_ids() {
    let id = SystemClock.mint();
    assert!(!id.is_empty());
    assert!(!id.contains(':'));
    assert!(!id.contains(' '));
    assert!(!id.contains('/'));
}
