use crate::apis::JobSource;
use crate::config::SourceConfig;
use crate::constants::{APP_ID_ENV, APP_KEY_ENV, CATEGORY_TAG};
use crate::error::{PipelineError, Result};
use crate::rate_limiter::{Limits, RateLimiter};
use crate::types::{RawBatch, RawJob};
use metrics::counter;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| -> Result<String> {
            match std::env::var(name) {
                Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(PipelineError::Config(format!(
                    "{name} is not set; put the search API credentials in the environment or .env"
                ))),
            }
        };
        Ok(Self {
            app_id: read(APP_ID_ENV)?,
            app_key: read(APP_KEY_ENV)?,
        })
    }
}

/// Client for the Adzuna job-search API.
pub struct AdzunaClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    results_per_page: u32,
    limiter: RateLimiter,
}

impl AdzunaClient {
    pub fn new(settings: &SourceConfig, credentials: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credentials,
            results_per_page: settings.results_per_page,
            limiter: RateLimiter::new(Limits {
                requests_per_min: Some(settings.requests_per_min),
                concurrency: Some(1),
            }),
        })
    }

    pub fn search_url(&self, country_code: &str, page: u32) -> String {
        format!("{}/{}/search/{}", self.base_url, country_code, page)
    }
}

#[async_trait::async_trait]
impl JobSource for AdzunaClient {
    fn source_name(&self) -> &'static str {
        "adzuna"
    }

    #[instrument(skip(self))]
    async fn fetch_page(&self, country_code: &str, keyword: &str, page: u32) -> Result<Vec<RawJob>> {
        let url = self.search_url(country_code, page);
        let results_per_page = self.results_per_page.to_string();

        let _permit = self.limiter.acquire().await;
        counter!("job_market_api_requests_total", "country" => country_code.to_string())
            .increment(1);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("app_id", self.credentials.app_id.as_str()),
                ("app_key", self.credentials.app_key.as_str()),
                ("what", keyword),
                ("results_per_page", results_per_page.as_str()),
                ("content-type", "application/json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(100).collect();
            return Err(PipelineError::Api {
                message: format!("{url} returned {status}: {snippet}"),
            });
        }

        let body: Value = response.json().await?;
        let jobs = results_from_response(body);
        debug!(
            "Got {} jobs for {}/{} page {}",
            jobs.len(),
            country_code,
            keyword,
            page
        );
        Ok(jobs)
    }
}

/// Pulls the `results` array out of a search response; anything else is empty.
pub fn results_from_response(body: Value) -> Vec<RawJob> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(results)) => results,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Pages through every keyword for one country. Each job is stamped with the
/// keyword it was found under. An empty page ends that keyword; a failed
/// page is logged and ends that keyword without failing the country.
#[instrument(skip(source, keywords))]
pub async fn collect_country(
    source: &dyn JobSource,
    country_code: &str,
    country_name: &str,
    keywords: &[String],
    max_pages: u32,
) -> RawBatch {
    let mut jobs = Vec::new();

    for keyword in keywords {
        for page in 1..=max_pages {
            let page_jobs = match source.fetch_page(country_code, keyword, page).await {
                Ok(page_jobs) => page_jobs,
                Err(e) => {
                    warn!("Request failed for '{}' page {}, skipping keyword: {}", keyword, page, e);
                    break;
                }
            };
            if page_jobs.is_empty() {
                debug!("No more results for '{}'", keyword);
                break;
            }
            jobs.extend(page_jobs.into_iter().map(|job| tag_category(job, keyword)));
        }
    }

    info!("Collected {} jobs for {} ({})", jobs.len(), country_name, country_code);
    RawBatch {
        country_code: country_code.to_string(),
        country_name: country_name.to_string(),
        total_jobs: jobs.len(),
        keywords: keywords.to_vec(),
        jobs,
    }
}

fn tag_category(mut job: RawJob, keyword: &str) -> RawJob {
    if let Value::Object(map) = &mut job {
        map.insert(CATEGORY_TAG.to_string(), Value::String(keyword.to_string()));
    }
    job
}

/// Persists one batch as `<raw_dir>/<country_code>.json`.
pub fn write_batch(raw_dir: &Path, batch: &RawBatch) -> Result<PathBuf> {
    fs::create_dir_all(raw_dir)?;
    let path = raw_dir.join(format!("{}.json", batch.country_code));
    fs::write(&path, serde_json::to_string_pretty(batch)?)?;
    Ok(path)
}

#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub files_written: Vec<PathBuf>,
    pub total_jobs: usize,
}

/// Collects every configured country (or only those in `only`) and writes
/// one batch file per country.
pub async fn extract_all(
    source: &dyn JobSource,
    settings: &SourceConfig,
    raw_dir: &Path,
    only: Option<&[String]>,
) -> Result<ExtractSummary> {
    let mut summary = ExtractSummary::default();

    for (code, name) in &settings.countries {
        if let Some(only) = only {
            if !only.iter().any(|c| c.eq_ignore_ascii_case(code)) {
                continue;
            }
        }
        let batch = collect_country(source, code, name, &settings.keywords, settings.max_pages).await;
        let path = write_batch(raw_dir, &batch)?;
        info!("Saved {} jobs to {}", batch.total_jobs, path.display());
        summary.total_jobs += batch.total_jobs;
        summary.files_written.push(path);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::load_raw_batches;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Serves `pages_per_keyword` pages of two jobs each, then empty pages.
    /// Keyword "broken" always fails.
    struct FakeSource {
        pages_per_keyword: u32,
        calls: Mutex<Vec<(String, String, u32)>>,
    }

    #[async_trait::async_trait]
    impl JobSource for FakeSource {
        fn source_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_page(&self, country_code: &str, keyword: &str, page: u32) -> Result<Vec<RawJob>> {
            self.calls
                .lock()
                .unwrap()
                .push((country_code.to_string(), keyword.to_string(), page));
            if keyword == "broken" {
                return Err(PipelineError::Api { message: "boom".into() });
            }
            if page > self.pages_per_keyword {
                return Ok(Vec::new());
            }
            Ok(vec![
                json!({"title": format!("{keyword} {page}a")}),
                json!({"title": format!("{keyword} {page}b")}),
            ])
        }
    }

    fn fake(pages: u32) -> FakeSource {
        FakeSource {
            pages_per_keyword: pages,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn stops_at_max_pages_and_tags_category() {
        let source = fake(5);
        let keywords = vec!["Data Analyst".to_string()];
        let batch = collect_country(&source, "sg", "Singapore", &keywords, 2).await;

        assert_eq!(batch.total_jobs, 4);
        assert_eq!(batch.jobs[0][CATEGORY_TAG], "Data Analyst");
        assert_eq!(source.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_page_and_failure_end_only_that_keyword() {
        let source = fake(1);
        let keywords = vec!["broken".to_string(), "Data Engineer".to_string()];
        let batch = collect_country(&source, "us", "United States", &keywords, 3).await;

        assert_eq!(batch.total_jobs, 2);
        let calls = source.calls.lock().unwrap();
        // broken: page 1 only; Data Engineer: page 1 with data, page 2 empty
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test]
    async fn extract_all_writes_batches_the_loader_reads() {
        let dir = tempdir().unwrap();
        let settings = SourceConfig {
            keywords: vec!["Software Engineer".to_string()],
            max_pages: 1,
            ..SourceConfig::default()
        };
        let only = vec!["SG".to_string(), "nz".to_string()];
        let summary = extract_all(&fake(1), &settings, dir.path(), Some(only.as_slice()))
            .await
            .unwrap();

        assert_eq!(summary.files_written.len(), 2);
        let loaded = load_raw_batches(dir.path()).unwrap();
        assert_eq!(loaded.records.len(), 4);
        assert_eq!(loaded.records[0].country_code, "nz");
    }

    #[test]
    fn results_default_to_empty() {
        assert_eq!(results_from_response(json!({"results": [{"id": 1}]})).len(), 1);
        assert!(results_from_response(json!({"count": 0})).is_empty());
        assert!(results_from_response(json!([])).is_empty());
    }

    #[test]
    fn search_url_has_country_and_page() {
        let client = AdzunaClient::new(
            &SourceConfig::default(),
            Credentials {
                app_id: "id".into(),
                app_key: "key".into(),
            },
        )
        .unwrap();
        assert_eq!(
            client.search_url("gb", 2),
            "https://api.adzuna.com/v1/api/jobs/gb/search/2"
        );
        assert!(!format!("{:?}", client.credentials).contains("\"key\""));
    }
}
