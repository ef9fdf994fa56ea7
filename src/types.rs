use crate::constants::SKILL_COLUMN_PREFIX;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One job posting exactly as the search API returned it. Attribute presence
/// and shape are not guaranteed.
pub type RawJob = serde_json::Value;

/// A raw job tagged with the country its batch was collected for.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub country_code: String,
    pub payload: RawJob,
}

impl RawRecord {
    pub fn new(country_code: impl Into<String>, payload: RawJob) -> Self {
        Self {
            country_code: country_code.into(),
            payload,
        }
    }
}

/// On-disk shape of one per-country batch written by the acquisition client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBatch {
    pub country_code: String,
    pub country_name: String,
    pub total_jobs: usize,
    pub keywords: Vec<String>,
    pub jobs: Vec<RawJob>,
}

/// Canonical per-job record produced by the extractor and completed by the
/// cleaner and skill tagger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub job_title: String,
    pub company: String,
    pub country: String,
    pub city: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: String,
    pub salary_period: String,
    pub job_description: String,
    pub date_posted: String,
    pub source: String,
    /// Always `Some` once the cleaner has run.
    pub region: Option<String>,
    pub has_salary: bool,
    /// Keyed by column name (`skill_python`, ...).
    #[serde(flatten)]
    pub skills: BTreeMap<String, bool>,
}

impl NormalizedRecord {
    pub fn salary_present(&self) -> bool {
        self.salary_min.is_some() || self.salary_max.is_some()
    }

    /// Whether the record mentions `skill`; `None` when the skill was never tagged.
    pub fn skill(&self, skill: &str) -> Option<bool> {
        self.skills.get(&skill_column(skill)).copied()
    }
}

/// Column name used for a tracked skill, e.g. `"SQL"` -> `"skill_sql"`.
pub fn skill_column(skill: &str) -> String {
    format!("{}{}", SKILL_COLUMN_PREFIX, skill.trim().to_lowercase())
}
