//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! run-scoped endpoint takes the company as a `company_id` query parameter;
//! the acting user is read from the `x-actor` header.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Anomaly, EmployeeRef, PayrollItem, PayrollRun};

use super::request::{AdjustItemRequest, ComputeRequest, CreateRunRequest, MarkPaidRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/runs", post(create_run_handler).get(list_runs_handler))
        .route("/runs/:run_id", get(run_detail_handler))
        .route("/runs/:run_id/compute", post(compute_handler))
        .route("/runs/:run_id/submit", post(submit_handler))
        .route("/runs/:run_id/approve", post(approve_handler))
        .route("/runs/:run_id/pay", post(mark_paid_handler))
        .route("/runs/:run_id/cancel", post(cancel_handler))
        .route("/runs/:run_id/anomalies", get(anomalies_handler))
        .route("/runs/:run_id/items/:item_id", patch(adjust_item_handler))
        .with_state(state)
}

/// Company scoping for run-scoped endpoints.
#[derive(Debug, Deserialize)]
struct CompanyQuery {
    company_id: Uuid,
}

/// Response body for `GET /runs/:id`.
#[derive(Debug, Serialize)]
struct RunDetailResponse {
    run: PayrollRun,
    items: Vec<PayrollItem>,
}

/// Response body for `GET /runs/:id/anomalies`.
#[derive(Debug, Serialize)]
struct AnomalyReportResponse {
    run_id: Uuid,
    anomalies: Vec<Anomaly>,
}

fn actor_from_headers(headers: &HeaderMap) -> &str {
    headers
        .get("x-actor")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("system")
}

/// Converts a JSON extraction failure into the API error body.
fn rejection_error(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}

fn engine_error(correlation_id: Uuid, err: crate::error::EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %err, "Request failed");
    let api_error: ApiErrorResponse = err.into();
    (
        api_error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(api_error.error),
    )
        .into_response()
}

fn ok_json<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Handler for POST /runs.
async fn create_run_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        company_id = %request.company_id,
        year_month = %request.year_month,
        "Creating payroll run"
    );

    match state
        .engine()
        .create_run(request.into(), actor_from_headers(&headers))
    {
        Ok(run) => ok_json(StatusCode::CREATED, run),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for GET /runs.
async fn list_runs_handler(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.engine().list_runs(query.company_id) {
        Ok(runs) => ok_json(StatusCode::OK, runs),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for GET /runs/:id.
async fn run_detail_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.engine().run_detail(query.company_id, run_id) {
        Ok((run, items)) => ok_json(StatusCode::OK, RunDetailResponse { run, items }),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /runs/:id/compute.
async fn compute_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
    headers: HeaderMap,
    payload: Result<Json<ComputeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        run_id = %run_id,
        employees = request.employees.len(),
        "Computing payroll items"
    );

    let roster: Vec<EmployeeRef> = request.employees.into_iter().map(Into::into).collect();
    match state.engine().compute_items(
        query.company_id,
        run_id,
        &roster,
        actor_from_headers(&headers),
    ) {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /runs/:id/submit.
async fn submit_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
    headers: HeaderMap,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state
        .engine()
        .submit_for_review(query.company_id, run_id, actor_from_headers(&headers))
    {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /runs/:id/approve.
async fn approve_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
    headers: HeaderMap,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state
        .engine()
        .approve(query.company_id, run_id, actor_from_headers(&headers))
    {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /runs/:id/pay.
async fn mark_paid_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
    headers: HeaderMap,
    payload: Result<Json<MarkPaidRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };

    match state.engine().mark_paid(
        query.company_id,
        run_id,
        request.pay_date,
        actor_from_headers(&headers),
    ) {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /runs/:id/cancel.
async fn cancel_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
    headers: HeaderMap,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state
        .engine()
        .cancel(query.company_id, run_id, actor_from_headers(&headers))
    {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for GET /runs/:id/anomalies.
async fn anomalies_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<CompanyQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.engine().review_anomalies(query.company_id, run_id) {
        Ok(anomalies) => {
            info!(
                correlation_id = %correlation_id,
                run_id = %run_id,
                anomaly_count = anomalies.len(),
                "Anomaly review completed"
            );
            ok_json(StatusCode::OK, AnomalyReportResponse { run_id, anomalies })
        }
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for PATCH /runs/:id/items/:item_id.
async fn adjust_item_handler(
    State(state): State<AppState>,
    Path((run_id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<CompanyQuery>,
    headers: HeaderMap,
    payload: Result<Json<AdjustItemRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        run_id = %run_id,
        item_id = %item_id,
        "Adjusting payroll item"
    );

    match state.engine().adjust_item(
        query.company_id,
        run_id,
        item_id,
        request.into(),
        actor_from_headers(&headers),
    ) {
        Ok(item) => ok_json(StatusCode::OK, item),
        Err(err) => engine_error(correlation_id, err),
    }
}
