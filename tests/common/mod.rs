use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use ragsync::storage::SledStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (SledStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SledStore::open(tmp.path().join("state")).expect("failed to open sled store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}

#[allow(dead_code)]
pub fn progress_json(stage: &str, status: &str, progress: u8) -> String {
    serde_json::json!({
        "stage": stage,
        "status": status,
        "progress": progress,
        "message": format!("{} in progress", stage),
    })
    .to_string()
}
