use crate::aggregate::{
    jobs_by_country, jobs_by_region, kpi_summary, salary_by_role, top_skills, CountryCount,
    KpiSummary, RegionCount, RoleSalary, SkillStat,
};
use crate::server::state::{AppState, Dataset};
use crate::types::NormalizedRecord;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};

pub const ENDPOINTS: [&str; 6] = [
    "/api/kpi",
    "/api/jobs",
    "/api/jobs-by-country",
    "/api/jobs-by-region",
    "/api/salary-by-role",
    "/api/top-skills",
];

#[derive(Debug)]
pub enum ApiError {
    NotReady,
    InvalidParam(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Data not ready. Run the transform command first.".to_string(),
            ),
            ApiError::InvalidParam(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

fn dataset<'a>(state: &'a AppState, endpoint: &'static str) -> Result<&'a Dataset, ApiError> {
    counter!("job_market_http_requests_total", "endpoint" => endpoint).increment(1);
    state.snapshot.dataset().ok_or(ApiError::NotReady)
}

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.snapshot.is_ready() {
        "running"
    } else {
        "data not loaded"
    };
    Json(serde_json::json!({
        "message": "Global Job Market Analysis API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": status,
        "endpoints": ENDPOINTS,
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let jobs = state.snapshot.dataset().map(|d| d.records.len());
    Json(serde_json::json!({
        "status": "healthy",
        "service": "job_market",
        "data_loaded": jobs.is_some(),
        "jobs": jobs,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn kpi(State(state): State<AppState>) -> Result<Json<KpiSummary>, ApiError> {
    let dataset = dataset(&state, "kpi")?;
    Ok(Json(kpi_summary(&dataset.records)))
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub country: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobsPage {
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
    pub count: usize,
    pub jobs: Vec<NormalizedRecord>,
}

/// Paged listing with optional exact country (any case) and title keyword
/// (substring, any case) filters. Empty filter values are ignored.
pub async fn jobs(
    State(state): State<AppState>,
    query: Result<Query<JobsQuery>, QueryRejection>,
) -> Result<Json<JobsPage>, ApiError> {
    let dataset = dataset(&state, "jobs")?;
    let Query(query) = query.map_err(|rejection| ApiError::InvalidParam(rejection.body_text()))?;

    let skip = match query.skip.unwrap_or(0) {
        s if s < 0 => {
            return Err(ApiError::InvalidParam("skip must be greater than or equal to 0".into()))
        }
        s => s as usize,
    };
    let max = state.paging.max_limit;
    let limit = match query.limit {
        None => state.paging.default_limit,
        Some(l) if l >= 1 && l as u64 <= max as u64 => l as usize,
        Some(_) => {
            return Err(ApiError::InvalidParam(format!(
                "limit must be between 1 and {max}"
            )))
        }
    };

    let country = query
        .country
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase);
    let keyword = query
        .keyword
        .as_deref()
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase);

    let matching: Vec<&NormalizedRecord> = dataset
        .records
        .iter()
        .filter(|r| country.as_ref().map_or(true, |c| r.country.to_lowercase() == *c))
        .filter(|r| {
            keyword
                .as_ref()
                .map_or(true, |k| r.job_title.to_lowercase().contains(k.as_str()))
        })
        .collect();

    let total = matching.len();
    let jobs: Vec<NormalizedRecord> = matching
        .into_iter()
        .skip(skip)
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(JobsPage {
        total,
        skip,
        limit,
        count: jobs.len(),
        jobs,
    }))
}

pub async fn by_country(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<CountryCount>>>, ApiError> {
    let dataset = dataset(&state, "jobs_by_country")?;
    Ok(DataEnvelope::new(jobs_by_country(&dataset.records)))
}

pub async fn by_region(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<RegionCount>>>, ApiError> {
    let dataset = dataset(&state, "jobs_by_region")?;
    Ok(DataEnvelope::new(jobs_by_region(&dataset.records)))
}

pub async fn salary_by_role_handler(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<RoleSalary>>>, ApiError> {
    let dataset = dataset(&state, "salary_by_role")?;
    Ok(DataEnvelope::new(salary_by_role(&dataset.records)))
}

pub async fn skills(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<SkillStat>>>, ApiError> {
    let dataset = dataset(&state, "top_skills")?;
    Ok(DataEnvelope::new(top_skills(&dataset.records, state.skills.as_slice())))
}
