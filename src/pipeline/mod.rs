//! Batch transform: load → extract → clean → tag skills → summarize → write.
//!
//! Each run is a full recompute over every raw batch on disk and needs no
//! network access.

pub mod clean;
pub mod extract;
pub mod loader;
pub mod output;
pub mod skills;

use crate::aggregate::{kpi_summary, KpiSummary, SkillStat};
use crate::config::Config;
use crate::error::Result;
use crate::types::NormalizedRecord;
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub use clean::{strip_markup, CleanReport, Cleaner};
pub use extract::extract_fields;
pub use loader::{load_raw_batches, LoadOutcome};
pub use output::{read_csv, write_outputs};
pub use skills::{SkillMatcher, SkillTagger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Completed,
    /// No raw batches were found; nothing was written.
    NoInput,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub status: PipelineStatus,
    pub files_loaded: usize,
    pub raw_records: usize,
    pub clean: CleanReport,
    pub skills: Vec<SkillStat>,
    pub kpis: KpiSummary,
    pub output_files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

pub struct Pipeline;

impl Pipeline {
    /// Runs every stage against the directories named in `config`.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub fn run(config: &Config) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        info!("Starting transform run");
        counter!("job_market_pipeline_runs_total").increment(1);
        let started = Instant::now();

        let loaded = load_raw_batches(&config.paths.raw_dir)?;
        if loaded.is_empty() {
            warn!("No data to process");
            return Ok(PipelineResult {
                run_id,
                status: PipelineStatus::NoInput,
                files_loaded: loaded.files_loaded,
                raw_records: 0,
                clean: CleanReport::default(),
                skills: Vec::new(),
                kpis: kpi_summary(&[]),
                output_files: Vec::new(),
                errors: loaded.errors,
            });
        }

        let (records, clean, skills) = Self::transform(&loaded, config)?;
        let kpis = kpi_summary(&records);
        info!(
            total_jobs = kpis.total_jobs,
            countries = kpis.total_countries,
            companies = kpis.total_companies,
            jobs_with_salary = kpis.jobs_with_salary,
            "KPI summary ({:.1}% with salary)",
            kpis.salary_percentage
        );

        let output_files = write_outputs(&records, &config.paths.output_dir)?;

        counter!("job_market_raw_records_total").increment(loaded.records.len() as u64);
        counter!("job_market_duplicates_removed_total").increment(clean.duplicates_removed as u64);
        counter!("job_market_clean_records_total").increment(records.len() as u64);
        histogram!("job_market_pipeline_duration_seconds").record(started.elapsed().as_secs_f64());

        info!("Transform run finished with {} records", records.len());
        Ok(PipelineResult {
            run_id,
            status: PipelineStatus::Completed,
            files_loaded: loaded.files_loaded,
            raw_records: loaded.records.len(),
            clean,
            skills,
            kpis,
            output_files,
            errors: loaded.errors,
        })
    }

    /// Stages 2–4 over already-loaded raw records.
    pub fn transform(
        loaded: &LoadOutcome,
        config: &Config,
    ) -> Result<(Vec<NormalizedRecord>, CleanReport, Vec<SkillStat>)> {
        let extracted: Vec<NormalizedRecord> = loaded.records.iter().map(extract_fields).collect();
        info!("Extracted {} jobs", extracted.len());

        let (mut records, report) = Cleaner::new(&config.regions).clean(extracted);

        let tagger = SkillTagger::new(&config.skills.track)?;
        let skills = tagger.tag(&mut records);

        Ok((records, report, skills))
    }
}
