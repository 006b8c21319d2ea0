//! HTTP and WebSocket surface consumed by the Mission Control dashboard.

mod error;
mod handlers;
mod websocket;

pub use error::{ApiError, ApiResult};

use crate::core::system_log::SystemLog;
use crate::core::workflow_manager::WorkflowManager;
use crate::domain::model::{timestamp, SystemStats};
use crate::domain::ports::AgentGateway;
use crate::utils::error::{MissionControlError, Result};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Option<Arc<dyn AgentGateway>>,
    pub workflows: Arc<WorkflowManager>,
    pub logs: Arc<SystemLog>,
    pub stats_interval: Duration,
}

impl AppState {
    pub fn new(
        gateway: Option<Arc<dyn AgentGateway>>,
        workflows: Arc<WorkflowManager>,
        logs: Arc<SystemLog>,
    ) -> Self {
        Self {
            gateway,
            workflows,
            logs,
            stats_interval: Duration::from_secs(3),
        }
    }

    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// The gateway, if there is one and it is currently connected.
    pub fn connected_gateway(&self) -> Option<&Arc<dyn AgentGateway>> {
        self.gateway.as_ref().filter(|g| g.is_connected())
    }

    pub fn is_connected(&self) -> bool {
        self.connected_gateway().is_some()
    }

    pub async fn stats(&self) -> SystemStats {
        let workflows = self.workflows.stats().await;
        let (subagents_active, sessions_active) = match self.connected_gateway() {
            Some(gateway) => (gateway.subagent_count(), gateway.session_count()),
            None => (0, 0),
        };

        SystemStats {
            workflows_total: workflows.total,
            workflows_running: workflows.running,
            workflows_completed: workflows.completed,
            workflows_failed: workflows.failed,
            subagents_active,
            sessions_active,
            timestamp: timestamp(),
        }
    }
}

pub fn create_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/status", get(handlers::status))
        .route("/api/stats", get(handlers::stats))
        .route("/api/gateway/status", get(handlers::gateway_status))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/sessions/{session_id}", get(handlers::get_session))
        .route(
            "/api/subagents",
            get(handlers::list_subagents).post(handlers::create_subagent),
        )
        .route("/api/subagents/{subagent_id}", delete(handlers::stop_subagent))
        .route(
            "/api/workflows",
            get(handlers::list_workflows).post(handlers::create_workflow),
        )
        .route("/api/workflows/templates/list", get(handlers::list_templates))
        .route("/api/workflows/{workflow_id}", get(handlers::get_workflow))
        .route("/api/workflows/{workflow_id}/start", post(handlers::start_workflow))
        .route("/api/workflows/{workflow_id}/cancel", post(handlers::cancel_workflow))
        .route("/api/logs", get(handlers::get_logs).post(handlers::add_log))
        .route("/ws", get(websocket::stats_socket))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// `*` anywhere in the list opens the API to every origin, without credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Binds `addr` and serves in the background until `shutdown` resolves.
///
/// Returns the bound address, which differs from `addr` when port 0 was requested.
pub async fn start_server<F>(
    addr: SocketAddr,
    state: AppState,
    cors_origins: &[String],
    shutdown: F,
) -> Result<(SocketAddr, JoinHandle<()>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        MissionControlError::config(format!("Failed to bind to {}: {}", addr, e))
    })?;
    let bound_addr = listener.local_addr()?;
    let app = create_app(state, cors_origins);

    tracing::info!("🚀 Mission Control API listening on http://{}", bound_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((bound_addr, handle))
}
