use crate::config::RegionTable;
use crate::constants::{UNKNOWN_CITY, UNKNOWN_COMPANY};
use crate::types::NormalizedRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument};

static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"));

/// Counters describing one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub input: usize,
    pub duplicates_removed: usize,
    pub unmapped_region: usize,
    pub output: usize,
}

/// Deduplicates, assigns regions, fills missing values, strips markup and
/// derives `has_salary`, in that order.
pub struct Cleaner<'a> {
    regions: &'a RegionTable,
}

impl<'a> Cleaner<'a> {
    pub fn new(regions: &'a RegionTable) -> Self {
        Self { regions }
    }

    #[instrument(skip_all, fields(records = records.len()))]
    pub fn clean(&self, records: Vec<NormalizedRecord>) -> (Vec<NormalizedRecord>, CleanReport) {
        let mut report = CleanReport {
            input: records.len(),
            ..CleanReport::default()
        };

        let mut cleaned = dedupe(records);
        report.duplicates_removed = report.input - cleaned.len();

        for record in &mut cleaned {
            if !self.regions.contains(&record.country) {
                report.unmapped_region += 1;
            }
            record.region = Some(self.regions.region_for(&record.country).to_string());

            fill_missing(record);
            record.job_description = strip_markup(&record.job_description);
            record.has_salary = record.salary_present();
        }
        report.output = cleaned.len();

        info!(
            "Removed {} duplicate jobs, {} jobs fell into the fallback region",
            report.duplicates_removed, report.unmapped_region
        );
        (cleaned, report)
    }
}

/// Keeps the first record for each `(job_title, company)` pair, comparing the
/// exact strings. A blank company is keyed as the value the missing-value
/// fill will give it, so a second pass over cleaned output drops nothing.
///
/// Two distinct postings that share a title and company collapse into one.
fn dedupe(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| {
            let company = or_default(&r.company, UNKNOWN_COMPANY);
            seen.insert((r.job_title.clone(), company.to_string()))
        })
        .collect()
}

fn fill_missing(record: &mut NormalizedRecord) {
    if is_blank(&record.city) {
        record.city = UNKNOWN_CITY.to_string();
    }
    if is_blank(&record.company) {
        record.company = UNKNOWN_COMPANY.to_string();
    }
}

fn or_default<'s>(value: &'s str, default: &'s str) -> &'s str {
    if is_blank(value) {
        default
    } else {
        value
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Removes `<...>` tags, collapses whitespace runs to one space and trims.
pub fn strip_markup(text: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(text, "");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::extract_fields;
    use crate::types::RawRecord;
    use serde_json::json;

    fn record(title: &str, company: &str, country: &str) -> NormalizedRecord {
        extract_fields(&RawRecord::new(
            country,
            json!({"title": title, "company": company}),
        ))
    }

    #[test]
    fn strip_markup_removes_tags_and_collapses_whitespace() {
        assert_eq!(
            strip_markup("  <p>Needs <b>SQL</b>\n\n and   Excel</p> "),
            "Needs SQL and Excel"
        );
        assert_eq!(strip_markup(""), "");
        assert_eq!(strip_markup("<br/>"), "");
    }

    #[test]
    fn keeps_first_duplicate_case_sensitively() {
        let regions = RegionTable::default();
        let mut first = record("Data Analyst", "Acme", "us");
        first.job_description = "first".into();
        let mut second = record("Data Analyst", "Acme", "us");
        second.job_description = "second".into();
        let differently_cased = record("data analyst", "Acme", "us");

        let (out, report) =
            Cleaner::new(&regions).clean(vec![first, second, differently_cased]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].job_description, "first");
        assert_eq!(report.duplicates_removed, 1);
    }

    #[test]
    fn assigns_regions_with_other_fallback() {
        let regions = RegionTable::default();
        let (out, report) = Cleaner::new(&regions)
            .clean(vec![record("A", "X", "sg"), record("B", "X", "fr")]);
        assert_eq!(out[0].region.as_deref(), Some("Southeast Asia"));
        assert_eq!(out[1].region.as_deref(), Some("Other"));
        assert_eq!(report.unmapped_region, 1);
    }

    #[test]
    fn fills_missing_city_and_company() {
        let regions = RegionTable::default();
        let (out, _) = Cleaner::new(&regions).clean(vec![record("A", "", "gb")]);
        assert_eq!(out[0].company, "Unknown Company");
        assert_eq!(out[0].city, "Unknown");
    }

    #[test]
    fn has_salary_follows_either_bound() {
        let regions = RegionTable::default();
        let mut only_max = record("A", "X", "us");
        only_max.salary_max = Some(10.0);
        let none = record("B", "X", "us");
        let (out, _) = Cleaner::new(&regions).clean(vec![only_max, none]);
        assert!(out[0].has_salary);
        assert!(!out[1].has_salary);
        for r in &out {
            assert_eq!(r.has_salary, r.salary_min.is_some() || r.salary_max.is_some());
        }
    }

    #[test]
    fn cleaning_twice_changes_nothing() {
        let regions = RegionTable::default();
        let mut html = record("A", "X", "de");
        html.job_description = "<div>Python  &amp; <i>AWS</i></div>".into();
        let input = vec![
            html,
            record("A", "X", "de"),
            record("B", "", "nz"),
            record("B", "Unknown Company", "nz"),
            record("C", "Y", "zz"),
        ];

        let cleaner = Cleaner::new(&regions);
        let (once, _) = cleaner.clean(input);
        let (twice, report) = cleaner.clean(once.clone());
        assert_eq!(once, twice);
        assert_eq!(report.duplicates_removed, 0);
    }
}
