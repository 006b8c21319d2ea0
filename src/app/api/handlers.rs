use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::adapters::simulated;
use crate::core::templates::TemplateSummary;
use crate::core::workflow::{WorkflowStatus, WorkflowView};
use crate::core::workflow_manager::{NewWorkflow, DEFAULT_LIST_LIMIT};
use crate::domain::model::{
    timestamp, GatewayStatus, LogEntry, Session, StatusResponse, Subagent, SubagentRequest,
    SystemStats,
};
use crate::utils::validation::validate_length;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_LIMIT: usize = 100;

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Mission Control API",
        "version": VERSION,
        "docs": "/docs",
        "status": "/api/status",
    }))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: if state.is_connected() { "healthy" } else { "degraded" }.to_string(),
        openclaw_connected: state.is_connected(),
        timestamp: timestamp(),
        version: VERSION.to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<SystemStats> {
    Json(state.stats().await)
}

pub async fn gateway_status(State(state): State<AppState>) -> Json<GatewayStatus> {
    let status = match &state.gateway {
        Some(gateway) => gateway.status().await,
        None => GatewayStatus {
            connected: false,
            gateway_url: "offline".to_string(),
            active_sessions: 0,
            active_subagents: 0,
            timestamp: timestamp(),
        },
    };
    Json(status)
}

// ---- sessions ----

pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<Vec<Session>>> {
    match state.connected_gateway() {
        Some(gateway) => Ok(Json(gateway.sessions().await?)),
        None => Ok(Json(simulated::sessions())),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Session>> {
    if let Some(gateway) = state.connected_gateway() {
        if let Some(session) = gateway.session(&session_id).await? {
            return Ok(Json(session));
        }
    }
    Err(ApiError::not_found("Session not found"))
}

// ---- subagents ----

pub async fn list_subagents(State(state): State<AppState>) -> ApiResult<Json<Vec<Subagent>>> {
    match state.connected_gateway() {
        Some(gateway) => Ok(Json(gateway.subagents().await?)),
        None => Ok(Json(simulated::subagents())),
    }
}

pub async fn create_subagent(
    State(state): State<AppState>,
    payload: Result<Json<SubagentRequest>, JsonRejection>,
) -> ApiResult<Json<Subagent>> {
    let Json(request) = payload?;
    validate_length("task", &request.task, 1, usize::MAX)
        .map_err(|_| ApiError::unprocessable("task must not be empty"))?;

    tracing::info!(
        "Creating subagent: {}",
        request.label.as_deref().unwrap_or("unnamed")
    );

    let Some(gateway) = state.connected_gateway() else {
        return Ok(Json(simulated::spawn(&request)));
    };

    let subagent = gateway.create_subagent(&request).await.map_err(|e| {
        tracing::error!("Failed to create subagent: {}", e);
        ApiError::internal(e.to_string())
    })?;
    state
        .logs
        .record("info", format!("Subagent created: {}", subagent.id), "api");

    Ok(Json(subagent))
}

pub async fn stop_subagent(
    State(state): State<AppState>,
    Path(subagent_id): Path<String>,
) -> Json<Value> {
    tracing::info!("Stopping subagent: {}", subagent_id);

    if let Some(gateway) = state.connected_gateway() {
        match gateway.stop_subagent(&subagent_id).await {
            Ok(true) => {
                state
                    .logs
                    .record("info", format!("Subagent stopped: {}", subagent_id), "api");
                return Json(json!({"success": true, "message": "Subagent stopped"}));
            }
            Ok(false) => {}
            Err(e) => tracing::error!("Failed to stop subagent {}: {}", subagent_id, e),
        }
    }

    Json(json!({"success": true, "message": "Subagent stopped (simulated)"}))
}

// ---- workflows ----

#[derive(Debug, Deserialize)]
pub struct WorkflowQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub auto_start: bool,
}

pub async fn list_workflows(
    State(state): State<AppState>,
    query: Result<Query<WorkflowQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<WorkflowView>>> {
    let Query(query) = query?;
    // Unknown statuses are ignored rather than rejected
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<WorkflowStatus>().ok());
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let workflows = state.workflows.list(status, limit).await;
    Ok(Json(workflows.iter().map(|w| w.view()).collect()))
}

pub async fn list_templates(State(state): State<AppState>) -> Json<Vec<TemplateSummary>> {
    Json(state.workflows.templates())
}

pub async fn get_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> ApiResult<Json<WorkflowView>> {
    state
        .workflows
        .get(&workflow_id)
        .await
        .map(|w| Json(w.view()))
        .ok_or_else(|| ApiError::not_found("Workflow not found"))
}

pub async fn create_workflow(
    State(state): State<AppState>,
    payload: Result<Json<CreateWorkflowRequest>, JsonRejection>,
) -> ApiResult<Json<WorkflowView>> {
    let Json(request) = payload?;
    tracing::info!("Creating workflow: {}", request.name);

    let workflow = state
        .workflows
        .create(NewWorkflow {
            name: request.name,
            description: request.description.unwrap_or_default(),
            team: request.team.unwrap_or_default(),
            template: request.template,
            created_by: "api".to_string(),
        })
        .await?;

    state
        .logs
        .record("info", format!("Workflow created: {}", workflow.name), "api");

    if request.auto_start {
        state.workflows.start(&workflow.id).await?;
        if let Some(started) = state.workflows.get(&workflow.id).await {
            return Ok(Json(started.view()));
        }
    }

    Ok(Json(workflow.view()))
}

pub async fn start_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.workflows.start(&workflow_id).await?;
    state
        .logs
        .record("info", format!("Workflow started: {}", workflow_id), "api");
    Ok(Json(json!({"success": true, "message": "Workflow started"})))
}

pub async fn cancel_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.workflows.cancel(&workflow_id).await?;
    state
        .logs
        .record("warning", format!("Workflow cancelled: {}", workflow_id), "api");
    Ok(Json(json!({"success": true, "message": "Workflow cancelled"})))
}

// ---- logs ----

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
    pub source: Option<String>,
}

pub async fn get_logs(
    State(state): State<AppState>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    let Query(query) = query?;
    Ok(Json(state.logs.recent(
        query.limit.unwrap_or(DEFAULT_LOG_LIMIT),
        query.source.as_deref(),
    )))
}

pub async fn add_log(
    State(state): State<AppState>,
    payload: Result<Json<LogEntry>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(mut entry) = payload?;
    if entry.source.is_none() {
        entry.source = Some("external".to_string());
    }
    state.logs.push(entry);
    Ok(Json(json!({"success": true})))
}
