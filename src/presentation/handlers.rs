// HTTP request handlers
use crate::application::attendance_handler::{AttendanceError, BulkOutcome};
use crate::presentation::app_state::AppState;
use crate::presentation::bootstrap::{submit_form, type_search};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error("no element with id {0}")]
    NotFound(String),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = match &self {
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Attendance(e) => match e {
                AttendanceError::NoSelection => StatusCode::BAD_REQUEST,
                AttendanceError::UnknownControl(_) => StatusCode::NOT_FOUND,
                AttendanceError::ControlBusy(_) => StatusCode::CONFLICT,
                AttendanceError::MissingAttribute { .. } | AttendanceError::InvalidStatus(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AttendanceError::Api(_) => StatusCode::BAD_GATEWAY,
                AttendanceError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct BulkActionRequest {
    pub action: String,
    /// Checkbox values to tick before the action runs; omitted keeps the current selection
    #[serde(default)]
    pub selected: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Deserialize)]
pub struct DateRequest {
    pub date: NaiveDate,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current document with live notifications
pub async fn render_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.lock().await.render_html())
}

pub async fn chart_configs(State(state): State<Arc<AppState>>) -> Json<Value> {
    let charts = state.charts.read().await;
    Json(json!({
        "distribution": charts.distribution_config(),
        "trend": charts.trend_config(),
    }))
}

/// Click a single mark-attendance control
pub async fn mark_control(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, HandlerError> {
    let control_state = state.attendance.mark(&id).await?;
    Ok(Json(json!({ "control": id, "state": control_state })))
}

pub async fn control_status(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<Value> {
    let control_state = state.attendance.control_state(&id).await;
    Json(json!({ "control": id, "state": control_state }))
}

pub async fn bulk_action(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkActionRequest>,
) -> Result<Json<BulkOutcome>, HandlerError> {
    if let Some(selected) = &request.selected {
        state.attendance.select_students(selected).await;
    }
    let outcome = state.attendance.handle_bulk_action(&request.action).await?;
    Ok(Json(outcome))
}

pub async fn search(
    Path(search_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Value>, HandlerError> {
    let mut page = state.page.lock().await;
    let visible = type_search(&mut page, &search_id, &request.query)
        .ok_or(HandlerError::NotFound(search_id))?;
    Ok(Json(json!({ "visible": visible })))
}

/// Announce an attendance change made elsewhere
pub async fn attendance_updated(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "notified": state.signal.dispatch() }))
}

pub async fn submit(
    Path(form_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HandlerError> {
    let mut page = state.page.lock().await;
    if submit_form(page.document_mut(), &form_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HandlerError::NotFound(form_id))
    }
}

pub async fn change_date(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DateRequest>,
) -> Json<Value> {
    let query = state.attendance.set_date(request.date).await;
    Json(json!({ "navigate": query }))
}
