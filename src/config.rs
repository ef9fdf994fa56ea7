use crate::constants::OTHER_REGION;
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub skills: SkillsConfig,
    pub regions: RegionTable,
    pub server: ServerConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw_jobs"),
            output_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    pub track: Vec<String>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            track: ["Python", "SQL", "AWS", "Excel", "English"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Country code to region lookup. Keys are stored lower-cased so lookups
/// ignore the casing of both the table and the record.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct RegionTable {
    by_country: BTreeMap<String, String>,
}

impl From<BTreeMap<String, String>> for RegionTable {
    fn from(raw: BTreeMap<String, String>) -> Self {
        Self {
            by_country: raw
                .into_iter()
                .map(|(code, region)| (code.trim().to_lowercase(), region))
                .collect(),
        }
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        let pairs = [
            ("sg", "Southeast Asia"),
            ("us", "North America"),
            ("gb", "Europe"),
            ("de", "Europe"),
            ("in", "Asia"),
            ("it", "Europe"),
            ("nl", "Europe"),
            ("nz", "Oceania"),
        ];
        pairs
            .iter()
            .map(|(c, r)| (c.to_string(), r.to_string()))
            .collect::<BTreeMap<_, _>>()
            .into()
    }
}

impl RegionTable {
    /// Region for a country code, or `"Other"` when the code is not in the table.
    pub fn region_for(&self, country: &str) -> &str {
        self.by_country
            .get(&country.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(OTHER_REGION)
    }

    pub fn contains(&self, country: &str) -> bool {
        self.by_country.contains_key(&country.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_country.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_country.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            default_page_size: 100,
            max_page_size: 500,
            metrics_port: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub results_per_page: u32,
    pub max_pages: u32,
    pub requests_per_min: u64,
    pub timeout_seconds: u64,
    pub keywords: Vec<String>,
    pub countries: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let countries = [
            ("sg", "Singapore"),
            ("us", "United States"),
            ("gb", "United Kingdom"),
            ("de", "Germany"),
            ("in", "India"),
            ("it", "Italy"),
            ("nl", "Netherlands"),
            ("nz", "New Zealand"),
        ];
        Self {
            base_url: "https://api.adzuna.com/v1/api/jobs".to_string(),
            results_per_page: 50,
            max_pages: 2,
            requests_per_min: 30,
            timeout_seconds: 10,
            keywords: ["Data Analyst", "Data Engineer", "Software Engineer"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            countries: countries
                .iter()
                .map(|(c, n)| (c.to_string(), n.to_string()))
                .collect(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when it exists and falls back to the built-in defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "Config file not found, using built-in defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.max_page_size == 0 {
            return Err(PipelineError::Config(
                "server.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.server.default_page_size == 0
            || self.server.default_page_size > self.server.max_page_size
        {
            return Err(PipelineError::Config(format!(
                "server.default_page_size must be between 1 and {}",
                self.server.max_page_size
            )));
        }
        if self.skills.track.iter().any(|s| s.trim().is_empty()) {
            return Err(PipelineError::Config(
                "skills.track must not contain blank entries".to_string(),
            ));
        }
        Ok(())
    }
}
