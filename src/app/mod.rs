pub mod api;

use crate::adapters::{CliGateway, OpenClawClient};
use crate::config::{GatewayMode, Settings};
use crate::core::executor::AgentStepRunner;
use crate::core::system_log::SystemLog;
use crate::core::templates::TemplateCatalog;
use crate::core::workflow_manager::WorkflowManager;
use crate::domain::ports::AgentGateway;
use crate::utils::error::Result;
use api::AppState;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything the server needs, wired from resolved settings.
pub struct Application {
    pub state: AppState,
    cors_origins: Vec<String>,
}

impl Application {
    pub fn build(settings: &Settings) -> Self {
        let gateway: Option<Arc<dyn AgentGateway>> = match settings.gateway_mode {
            GatewayMode::WebSocket => Some(Arc::new(OpenClawClient::new(settings.ws.clone()))),
            GatewayMode::Cli => Some(Arc::new(CliGateway::new(settings.cli.clone()))),
            GatewayMode::Offline => None,
        };

        let templates = TemplateCatalog::builtin().with_templates(settings.templates.clone());
        let runner = Arc::new(AgentStepRunner::new(gateway.clone(), settings.timing));
        let workflows = Arc::new(WorkflowManager::new(templates, runner));
        let logs = Arc::new(SystemLog::new(settings.log_capacity));

        Self {
            state: AppState::new(gateway, workflows, logs).with_stats_interval(settings.stats_interval),
            cors_origins: settings.cors_origins.clone(),
        }
    }

    /// Tries the gateway once. Failure is not fatal: the API falls back to simulated data.
    pub async fn connect_gateway(&self) -> bool {
        let Some(gateway) = &self.state.gateway else {
            tracing::info!("Gateway disabled, API will run in simulated mode");
            self.state
                .logs
                .record("info", "Gateway disabled, running in simulated mode", "system");
            return false;
        };

        match gateway.connect().await {
            Ok(true) => {
                tracing::info!("✅ Connected to OpenClaw via {}", gateway.kind());
                self.state.logs.record(
                    "success",
                    format!("Connected to OpenClaw gateway at {}", gateway.endpoint()),
                    "system",
                );
                true
            }
            Ok(false) => {
                self.report_unreachable(gateway.as_ref(), "gateway not available");
                false
            }
            Err(e) => {
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                self.report_unreachable(gateway.as_ref(), &e.to_string());
                false
            }
        }
    }

    fn report_unreachable(&self, gateway: &dyn AgentGateway, reason: &str) {
        tracing::warn!(
            "⚠️ OpenClaw unreachable at {} ({}), API will run in simulated mode",
            gateway.endpoint(),
            reason
        );
        self.state.logs.record(
            "warning",
            "OpenClaw not connected, running in simulated mode",
            "system",
        );
    }

    pub async fn serve<F>(&self, addr: SocketAddr, shutdown: F) -> Result<(SocketAddr, JoinHandle<()>)>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        api::start_server(addr, self.state.clone(), &self.cors_origins, shutdown).await
    }

    /// Stops workflow executions and closes the gateway connection.
    pub async fn shutdown(&self) {
        self.state.workflows.shutdown();
        if let Some(gateway) = &self.state.gateway {
            gateway.disconnect().await;
        }
        tracing::info!("Mission Control API stopped");
    }
}
