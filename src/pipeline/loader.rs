use crate::error::Result;
use crate::types::{RawJob, RawRecord};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Everything the loader found in the raw directory.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub records: Vec<RawRecord>,
    pub files_loaded: usize,
    /// Files that could not be read or parsed; they are skipped, not fatal.
    pub errors: Vec<String>,
}

impl LoadOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads every `*.json` batch in `raw_dir`, in file-name order, and flattens
/// them into one record list tagged with each batch's country code.
///
/// A missing directory or an empty one is reported as an empty outcome.
#[instrument(skip_all, fields(raw_dir = %raw_dir.display()))]
pub fn load_raw_batches(raw_dir: &Path) -> Result<LoadOutcome> {
    let mut outcome = LoadOutcome::default();

    let files = batch_files(raw_dir)?;
    if files.is_empty() {
        warn!("No raw batch files found; run the extract command first");
        return Ok(outcome);
    }

    for path in files {
        match read_batch(&path) {
            Ok(batch) => {
                let country_code = batch.country_code();
                let jobs = batch.into_jobs();
                debug!(file = %path.display(), jobs = jobs.len(), "Read batch");
                outcome.records.extend(
                    jobs.into_iter()
                        .map(|job| RawRecord::new(country_code.as_str(), job)),
                );
                outcome.files_loaded += 1;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable batch");
                outcome
                    .errors
                    .push(format!("{}: {}", path.display(), e));
            }
        }
    }

    info!(
        "Loaded {} raw jobs from {} files",
        outcome.records.len(),
        outcome.files_loaded
    );
    Ok(outcome)
}

fn batch_files(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    if !raw_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(raw_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Only the parts of a batch file the loader needs. The collection metadata
/// (`total_jobs`, `keywords`, ...) is never decoded, so a malformed count
/// does not cost the jobs next to it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BatchJobs {
    country_code: Value,
    jobs: Value,
}

impl BatchJobs {
    fn country_code(&self) -> String {
        self.country_code.as_str().unwrap_or_default().to_string()
    }

    fn into_jobs(self) -> Vec<RawJob> {
        match self.jobs {
            Value::Array(jobs) => jobs,
            _ => Vec::new(),
        }
    }
}

fn read_batch(path: &Path) -> Result<BatchJobs> {
    let content = fs::read_to_string(path)?;
    let batch: BatchJobs = serde_json::from_str(&content)?;
    Ok(batch)
}
