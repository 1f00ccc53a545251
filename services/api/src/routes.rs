use crate::infra::{deserialize_optional_date, reference_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use health_dss::dss::personnel::{PersonnelCategory, PersonnelPopulationReport, PersonnelRecord};
use health_dss::dss::school::{SchoolCategory, SchoolPopulationReport, StudentRecord};
use health_dss::dss::{CategoryProjection, IndividualAssessment, StudentAssessment};
use health_dss::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssessmentRequest<R> {
    pub(crate) record: R,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PopulationRequest<R> {
    pub(crate) records: Vec<R>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterRequest<R, C> {
    pub(crate) category: C,
    pub(crate) records: Vec<R>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterResponse<C> {
    pub(crate) category: C,
    pub(crate) count: usize,
    pub(crate) individuals: Vec<CategoryProjection>,
}

pub(crate) fn dss_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/dss/personnel/assessment",
            post(personnel_assessment_endpoint),
        )
        .route(
            "/api/v1/dss/personnel/dashboard",
            post(personnel_dashboard_endpoint),
        )
        .route("/api/v1/dss/personnel/filter", post(personnel_filter_endpoint))
        .route("/api/v1/dss/school/assessment", post(student_assessment_endpoint))
        .route("/api/v1/dss/school/report", post(school_report_endpoint))
        .route("/api/v1/dss/school/filter", post(school_filter_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({
            "status": "ready",
            "personnelRules": state.registry.personnel().library().rule_count(),
            "schoolRules": state.registry.school().library().rule_count(),
        })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn personnel_assessment_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AssessmentRequest<PersonnelRecord>>,
) -> Result<Json<IndividualAssessment>, AppError> {
    let today = reference_date(payload.today);
    let assessment = state.registry.assess_personnel(&payload.record, today).await?;
    Ok(Json(assessment))
}

pub(crate) async fn personnel_dashboard_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<PopulationRequest<PersonnelRecord>>,
) -> Json<PersonnelPopulationReport> {
    let today = reference_date(payload.today);
    let report = state
        .registry
        .personnel_dashboard(payload.records, today)
        .await;
    info!(
        total = report.dashboard.total,
        failed = report.dashboard.failed,
        actions = report.preventive_action_plan.len(),
        "personnel dashboard generated"
    );
    Json(report)
}

pub(crate) async fn personnel_filter_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<FilterRequest<PersonnelRecord, PersonnelCategory>>,
) -> Json<FilterResponse<PersonnelCategory>> {
    let today = reference_date(payload.today);
    let individuals = state
        .registry
        .personnel_category(payload.records, payload.category, today)
        .await;
    Json(FilterResponse {
        category: payload.category,
        count: individuals.len(),
        individuals,
    })
}

pub(crate) async fn student_assessment_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AssessmentRequest<StudentRecord>>,
) -> Result<Json<StudentAssessment>, AppError> {
    let today = reference_date(payload.today);
    let result = state.registry.assess_student(&payload.record, today).await?;
    Ok(Json(result))
}

pub(crate) async fn school_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<PopulationRequest<StudentRecord>>,
) -> Json<SchoolPopulationReport> {
    let today = reference_date(payload.today);
    let report = state.registry.school_report(payload.records, today).await;
    info!(
        total = report.summary.total,
        failed = report.summary.failed,
        insights = report.insights.len(),
        "school report generated"
    );
    Json(report)
}

pub(crate) async fn school_filter_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<FilterRequest<StudentRecord, SchoolCategory>>,
) -> Json<FilterResponse<SchoolCategory>> {
    let today = reference_date(payload.today);
    let individuals = state
        .registry
        .school_category(payload.records, payload.category, today)
        .await;
    Json(FilterResponse {
        category: payload.category,
        count: individuals.len(),
        individuals,
    })
}
