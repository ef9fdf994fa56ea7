//! Read-only summary queries over the cleaned record set.
//!
//! Every function here is pure, takes the records by shared reference and
//! returns a fresh value; nothing is cached or persisted. Grouped results are
//! sorted by descending count, ties keep the ascending order of the grouping
//! key (or the vocabulary order for skills).

use crate::constants::{ROLE_MIN_SAMPLES, ROLE_TITLE_TOKENS, ROLE_TOP_N};
use crate::types::NormalizedRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_jobs: usize,
    pub total_countries: usize,
    pub total_companies: usize,
    pub jobs_with_salary: usize,
    pub salary_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
    pub region: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleSalary {
    pub role: String,
    /// `None` when no record of the role carries that bound.
    pub avg_salary_min: Option<f64>,
    pub avg_salary_max: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillStat {
    pub skill: String,
    pub count: usize,
    pub percentage: f64,
}

/// `part / total` as a percentage rounded to one decimal; 0 for an empty total.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn kpi_summary(records: &[NormalizedRecord]) -> KpiSummary {
    let countries: HashSet<&str> = records.iter().map(|r| r.country.as_str()).collect();
    let companies: HashSet<&str> = records.iter().map(|r| r.company.as_str()).collect();
    let jobs_with_salary = records.iter().filter(|r| r.has_salary).count();

    KpiSummary {
        total_jobs: records.len(),
        total_countries: countries.len(),
        total_companies: companies.len(),
        jobs_with_salary,
        salary_percentage: percentage(jobs_with_salary, records.len()),
    }
}

pub fn jobs_by_country(records: &[NormalizedRecord]) -> Vec<CountryCount> {
    count_by(records.iter().map(|r| Some(r.country.as_str())))
        .into_iter()
        .map(|(country, count)| CountryCount { country, count })
        .collect()
}

/// Records without a region are not counted; a set where no record has one
/// yields an empty list.
pub fn jobs_by_region(records: &[NormalizedRecord]) -> Vec<RegionCount> {
    count_by(records.iter().map(|r| r.region.as_deref()))
        .into_iter()
        .map(|(region, count)| RegionCount { region, count })
        .collect()
}

fn count_by<'a>(keys: impl Iterator<Item = Option<&'a str>>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in keys.flatten() {
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, c)| (k.to_string(), c))
        .collect();
    // stable: equal counts stay in key order
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Role grouping key: the first two whitespace-separated words of the title,
/// joined by one space. A one-word title is its own role; an empty title maps
/// to the empty role. No smarter normalization is attempted.
pub fn role_of(title: &str) -> String {
    title
        .split_whitespace()
        .take(ROLE_TITLE_TOKENS)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Default)]
struct RoleAccumulator {
    count: usize,
    min_sum: f64,
    min_n: usize,
    max_sum: f64,
    max_n: usize,
}

impl RoleAccumulator {
    fn add(&mut self, record: &NormalizedRecord) {
        self.count += 1;
        if let Some(v) = record.salary_min {
            self.min_sum += v;
            self.min_n += 1;
        }
        if let Some(v) = record.salary_max {
            self.max_sum += v;
            self.max_n += 1;
        }
    }

    fn mean(sum: f64, n: usize) -> Option<f64> {
        (n > 0).then(|| sum / n as f64)
    }
}

/// Mean salary bounds per role over records that have at least one bound.
/// Each bound is averaged only over the records that carry it. Roles with
/// fewer than 3 such records are dropped; the 10 largest remain.
pub fn salary_by_role(records: &[NormalizedRecord]) -> Vec<RoleSalary> {
    let mut roles: BTreeMap<String, RoleAccumulator> = BTreeMap::new();
    for record in records.iter().filter(|r| r.salary_present()) {
        roles.entry(role_of(&record.job_title)).or_default().add(record);
    }

    let mut out: Vec<RoleSalary> = roles
        .into_iter()
        .filter(|(_, acc)| acc.count >= ROLE_MIN_SAMPLES)
        .map(|(role, acc)| RoleSalary {
            role,
            avg_salary_min: RoleAccumulator::mean(acc.min_sum, acc.min_n),
            avg_salary_max: RoleAccumulator::mean(acc.max_sum, acc.max_n),
            count: acc.count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out.truncate(ROLE_TOP_N);
    out
}

/// Count and share of records mentioning each skill of `vocabulary`. Skills
/// that no record carries as an attribute are left out.
pub fn top_skills<S: AsRef<str>>(records: &[NormalizedRecord], vocabulary: &[S]) -> Vec<SkillStat> {
    let total = records.len();
    let mut out: Vec<SkillStat> = vocabulary
        .iter()
        .map(|s| s.as_ref())
        .filter(|skill| records.iter().any(|r| r.skill(skill).is_some()))
        .map(|skill| {
            let count = records
                .iter()
                .filter(|r| r.skill(skill).unwrap_or(false))
                .count();
            SkillStat {
                skill: skill.to_string(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}
