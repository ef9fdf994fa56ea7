use axum::body::Body;
use axum::http::{Request, StatusCode};
use job_market::server::{create_router, AppState, DatasetSnapshot, Paging};
use job_market::types::NormalizedRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tower::ServiceExt;

fn job(title: &str, company: &str, country: &str, region: &str, salary: Option<f64>) -> NormalizedRecord {
    let mut skills = BTreeMap::new();
    skills.insert("skill_sql".to_string(), title.contains("Data"));
    skills.insert("skill_python".to_string(), title.contains("Engineer"));
    NormalizedRecord {
        job_title: title.to_string(),
        company: company.to_string(),
        country: country.to_string(),
        city: "Unknown".to_string(),
        salary_min: salary,
        salary_max: salary.map(|s| s + 10000.0),
        salary_currency: "USD".to_string(),
        salary_period: "year".to_string(),
        job_description: String::new(),
        date_posted: String::new(),
        source: "Adzuna".to_string(),
        region: Some(region.to_string()),
        has_salary: salary.is_some(),
        skills,
    }
}

fn sample_state() -> AppState {
    let records = vec![
        job("Data Analyst", "Acme", "US", "North America", Some(50000.0)),
        job("Data Analyst II", "Globex", "US", "North America", Some(60000.0)),
        job("Data Analyst", "Initech", "GB", "Europe", Some(40000.0)),
        job("Software Engineer", "Hooli", "SG", "Southeast Asia", None),
    ];
    AppState::new(
        DatasetSnapshot::from_records(records),
        vec!["Python".to_string(), "SQL".to_string(), "AWS".to_string()],
        Paging {
            default_limit: 2,
            max_limit: 3,
        },
    )
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = create_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn data_routes_are_unavailable_before_load() {
    let state = AppState::new(
        DatasetSnapshot::load(Path::new("does/not/exist.csv")),
        Vec::new(),
        Paging::default(),
    );

    for uri in [
        "/api/kpi",
        "/api/jobs",
        "/api/jobs-by-country",
        "/api/jobs-by-region",
        "/api/salary-by-role",
        "/api/top-skills",
    ] {
        let (status, body) = get(state.clone(), uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert!(body["detail"].is_string());
    }

    let (status, body) = get(state.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data_loaded"], false);

    let (_, body) = get(state, "/").await;
    assert_eq!(body["status"], "data not loaded");
}

#[tokio::test]
async fn kpi_summarizes_the_snapshot() {
    let (status, body) = get(sample_state(), "/api/kpi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_jobs"], 4);
    assert_eq!(body["total_countries"], 3);
    assert_eq!(body["total_companies"], 4);
    assert_eq!(body["jobs_with_salary"], 3);
    assert_eq!(body["salary_percentage"], 75.0);
}

#[tokio::test]
async fn jobs_are_paged_with_configured_limits() {
    let (status, body) = get(sample_state(), "/api/jobs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["count"], 2);
    assert_eq!(body["jobs"][0]["company"], "Acme");

    let (_, body) = get(sample_state(), "/api/jobs?skip=3&limit=3").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["jobs"][0]["company"], "Hooli");
    assert_eq!(body["jobs"][0]["skill_python"], true);

    let (_, body) = get(sample_state(), "/api/jobs?skip=10").await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["total"], 4);
}

#[tokio::test]
async fn out_of_range_paging_is_rejected() {
    for uri in [
        "/api/jobs?limit=0",
        "/api/jobs?limit=4",
        "/api/jobs?skip=-1",
        "/api/jobs?skip=abc",
        "/api/jobs?limit=1.5",
    ] {
        let (status, body) = get(sample_state(), uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert!(body["detail"].is_string());
    }
}

#[tokio::test]
async fn jobs_filter_by_country_and_keyword() {
    let (_, body) = get(sample_state(), "/api/jobs?country=us&limit=3").await;
    assert_eq!(body["total"], 2);

    let (_, body) = get(sample_state(), "/api/jobs?keyword=ANALYST&limit=3").await;
    assert_eq!(body["total"], 3);

    let (_, body) = get(sample_state(), "/api/jobs?country=GB&keyword=analyst").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["jobs"][0]["company"], "Initech");

    let (_, body) = get(sample_state(), "/api/jobs?country=&keyword=").await;
    assert_eq!(body["total"], 4);
}

#[tokio::test]
async fn grouped_counts_are_wrapped_and_sorted() {
    let (_, body) = get(sample_state(), "/api/jobs-by-country").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["country"], "US");
    assert_eq!(data[0]["count"], 2);
    assert_eq!(data.len(), 3);

    let (_, body) = get(sample_state(), "/api/jobs-by-region").await;
    assert_eq!(body["data"][0]["region"], "North America");
    assert_eq!(body["data"][0]["count"], 2);
}

#[tokio::test]
async fn salary_by_role_needs_three_samples() {
    let (_, body) = get(sample_state(), "/api/salary-by-role").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["role"], "Data Analyst");
    assert_eq!(data[0]["count"], 3);
    assert_eq!(data[0]["avg_salary_min"], 50000.0);
    assert_eq!(data[0]["avg_salary_max"], 60000.0);
}

#[tokio::test]
async fn top_skills_use_the_configured_vocabulary() {
    let (_, body) = get(sample_state(), "/api/top-skills").await;
    let data = body["data"].as_array().unwrap();
    // AWS was never tagged on these records
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["skill"], "SQL");
    assert_eq!(data[0]["count"], 3);
    assert_eq!(data[0]["percentage"], 75.0);
    assert_eq!(data[1]["skill"], "Python");
    assert_eq!(data[1]["percentage"], 25.0);
}
