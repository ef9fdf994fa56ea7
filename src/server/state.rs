use crate::pipeline::read_csv;
use crate::types::NormalizedRecord;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// The cleaned record set the API answers from. Never mutated after load.
#[derive(Debug)]
pub struct Dataset {
    pub records: Vec<NormalizedRecord>,
    pub origin: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

/// Loaded once at startup and then frozen. `NotLoaded` makes every data
/// endpoint answer "not ready" instead of failing the process.
#[derive(Debug)]
pub enum DatasetSnapshot {
    NotLoaded { reason: String },
    Loaded(Dataset),
}

impl DatasetSnapshot {
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!("Dataset not found at {}; run the transform command first", path.display());
            return Self::NotLoaded {
                reason: format!("{} does not exist", path.display()),
            };
        }
        match read_csv(path) {
            Ok(records) => {
                info!("Loaded {} jobs from {}", records.len(), path.display());
                Self::Loaded(Dataset {
                    records,
                    origin: Some(path.to_path_buf()),
                    loaded_at: Utc::now(),
                })
            }
            Err(e) => {
                warn!("Failed to load dataset from {}: {}", path.display(), e);
                Self::NotLoaded {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn from_records(records: Vec<NormalizedRecord>) -> Self {
        Self::Loaded(Dataset {
            records,
            origin: None,
            loaded_at: Utc::now(),
        })
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Loaded(dataset) => Some(dataset),
            Self::NotLoaded { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.dataset().is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 500,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<DatasetSnapshot>,
    pub skills: Arc<Vec<String>>,
    pub paging: Paging,
}

impl AppState {
    pub fn new(snapshot: DatasetSnapshot, skills: Vec<String>, paging: Paging) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            skills: Arc::new(skills),
            paging,
        }
    }
}
