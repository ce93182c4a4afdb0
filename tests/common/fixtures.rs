//! On-disk fixtures for upload tests

use batch_uploader::Job;
use std::path::Path;
use tempfile::TempDir;

/// Contents written to every fixture file
pub const FILE_CONTENT: &str = "batch-uploader fixture payload\n";

/// Create `names` inside a fresh temp dir and return the dir with one job per file
pub fn write_files(names: &[&str]) -> (TempDir, Vec<Job>) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let jobs = names
        .iter()
        .map(|name| write_file(dir.path(), name, FILE_CONTENT))
        .collect();
    (dir, jobs)
}

/// Write a single file and return its job
pub fn write_file(dir: &Path, name: &str, contents: &str) -> Job {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write fixture file");
    Job::from(path)
}
