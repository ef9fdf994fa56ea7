use crate::constants::{CLEAN_CSV_FILE, CLEAN_JSON_FILE, SKILL_COLUMN_PREFIX};
use crate::error::Result;
use crate::types::NormalizedRecord;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const FIXED_COLUMNS: [&str; 13] = [
    "job_title",
    "company",
    "country",
    "city",
    "salary_min",
    "salary_max",
    "salary_currency",
    "salary_period",
    "job_description",
    "date_posted",
    "source",
    "region",
    "has_salary",
];

/// Writes the cleaned records as `clean_jobs.csv` and `clean_jobs.json` under
/// `output_dir` and returns the paths written.
pub fn write_outputs(records: &[NormalizedRecord], output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let csv_path = output_dir.join(CLEAN_CSV_FILE);
    write_csv(records, &csv_path)?;
    info!("Saved CSV: {}", csv_path.display());

    let json_path = output_dir.join(CLEAN_JSON_FILE);
    write_json(records, &json_path)?;
    info!("Saved JSON: {}", json_path.display());

    Ok(vec![csv_path, json_path])
}

pub fn write_csv(records: &[NormalizedRecord], path: &Path) -> Result<()> {
    let skill_columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.skills.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    let header: Vec<&str> = FIXED_COLUMNS
        .iter()
        .copied()
        .chain(skill_columns.iter().copied())
        .collect();
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.job_title.clone(),
            record.company.clone(),
            record.country.clone(),
            record.city.clone(),
            optional_number(record.salary_min),
            optional_number(record.salary_max),
            record.salary_currency.clone(),
            record.salary_period.clone(),
            record.job_description.clone(),
            record.date_posted.clone(),
            record.source.clone(),
            record.region.clone().unwrap_or_default(),
            record.has_salary.to_string(),
        ];
        row.extend(skill_columns.iter().map(|column| {
            record
                .skills
                .get(*column)
                .copied()
                .unwrap_or(false)
                .to_string()
        }));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_json(records: &[NormalizedRecord], path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(records)?;
    fs::write(path, content)?;
    Ok(())
}

/// Reads a cleaned CSV back into records. Rows that cannot be decoded are
/// skipped with a warning. Salary cells that are empty or not numeric become
/// absent, a missing `region` column leaves every region absent, and any
/// `skill_*` column is picked up from the header.
pub fn read_csv(path: &Path) -> Result<Vec<NormalizedRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
    let skill_columns: Vec<(&str, usize)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with(SKILL_COLUMN_PREFIX))
        .map(|(i, h)| (h, i))
        .collect();

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping unreadable row");
                continue;
            }
        };
        let cell = |name: &str| index.get(name).and_then(|&i| row.get(i));
        let text = |name: &str| cell(name).unwrap_or_default().to_string();

        let salary_min = cell("salary_min").and_then(parse_number);
        let salary_max = cell("salary_max").and_then(parse_number);
        let has_salary = cell("has_salary")
            .and_then(parse_bool)
            .unwrap_or(salary_min.is_some() || salary_max.is_some());
        let region = cell("region")
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        let skills: BTreeMap<String, bool> = skill_columns
            .iter()
            .map(|(name, i)| {
                let hit = row.get(*i).and_then(parse_bool).unwrap_or(false);
                (name.to_string(), hit)
            })
            .collect();

        records.push(NormalizedRecord {
            job_title: text("job_title"),
            company: text("company"),
            country: text("country"),
            city: text("city"),
            salary_min,
            salary_max,
            salary_currency: text("salary_currency"),
            salary_period: text("salary_period"),
            job_description: text("job_description"),
            date_posted: text("date_posted"),
            source: text("source"),
            region,
            has_salary,
            skills,
        });
    }
    Ok(records)
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
