use crate::constants::{SALARY_CURRENCY, SALARY_PERIOD, SOURCE_NAME};
use crate::types::{NormalizedRecord, RawRecord};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maps one raw job into the normalized shape. Never fails: anything missing
/// or malformed degrades to an empty value that the cleaner fills later.
pub fn extract_fields(raw: &RawRecord) -> NormalizedRecord {
    let job = &raw.payload;

    NormalizedRecord {
        job_title: scalar_text(job.get("title")),
        company: display_name(job.get("company")),
        country: raw.country_code.trim().to_uppercase(),
        city: display_name(job.get("location")),
        salary_min: salary(job.get("salary_min")),
        salary_max: salary(job.get("salary_max")),
        salary_currency: SALARY_CURRENCY.to_string(),
        salary_period: SALARY_PERIOD.to_string(),
        job_description: string_only(job.get("description")),
        date_posted: scalar_text(job.get("created")),
        source: SOURCE_NAME.to_string(),
        region: None,
        has_salary: false,
        skills: BTreeMap::new(),
    }
}

/// `location` and `company` arrive either as `{"display_name": ...}` or as a
/// bare scalar.
fn display_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::Object(map)) => scalar_text(map.get("display_name")),
        other => scalar_text(other),
    }
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn string_only(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

fn salary(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
