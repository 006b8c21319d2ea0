use crate::adapters::{CliGatewayConfig, WsGatewayConfig};
use crate::config::toml_config::TomlConfig;
use crate::core::executor::ExecutionTiming;
use crate::core::system_log::DEFAULT_CAPACITY;
use crate::core::templates::WorkflowTemplate;
use crate::utils::error::{MissionControlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// How the API reaches OpenClaw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    #[default]
    WebSocket,
    Cli,
    /// Never connect; serve simulated data.
    Offline,
}

impl FromStr for GatewayMode {
    type Err = MissionControlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::WebSocket),
            "cli" => Ok(Self::Cli),
            "offline" | "none" => Ok(Self::Offline),
            other => Err(MissionControlError::InvalidConfigValueError {
                field: "gateway.mode".to_string(),
                value: other.to_string(),
                reason: "Expected one of: websocket, cli, offline".to_string(),
            }),
        }
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub gateway_mode: GatewayMode,
    pub ws: WsGatewayConfig,
    pub cli: CliGatewayConfig,
    pub timing: ExecutionTiming,
    pub templates: Vec<WorkflowTemplate>,
    pub stats_interval: Duration,
    pub log_capacity: usize,
    pub cors_origins: Vec<String>,
    pub verbose: bool,
    pub json_logs: bool,
    pub monitor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            gateway_mode: GatewayMode::default(),
            ws: WsGatewayConfig::default(),
            cli: CliGatewayConfig::default(),
            timing: ExecutionTiming::default(),
            templates: Vec::new(),
            stats_interval: Duration::from_secs(3),
            log_capacity: DEFAULT_CAPACITY,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "*".to_string(),
            ],
            verbose: false,
            json_logs: false,
            monitor: false,
        }
    }
}

impl Settings {
    /// Defaults overlaid with whatever the file sets.
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        config.validate()?;
        let mut settings = Self::default();

        let server = &config.server;
        if let Some(host) = &server.host {
            settings.host = host.clone();
        }
        if let Some(port) = server.port {
            settings.port = port;
        }
        if let Some(secs) = server.stats_interval_seconds {
            settings.stats_interval = Duration::from_secs(secs);
        }
        if let Some(capacity) = server.log_capacity {
            settings.log_capacity = capacity;
        }

        let gateway = &config.gateway;
        if let Some(mode) = &gateway.mode {
            settings.gateway_mode = mode.parse()?;
        }
        if let Some(url) = &gateway.url {
            settings.ws.url = url.clone();
        }
        if let Some(secs) = gateway.connect_timeout_seconds {
            settings.ws.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = gateway.response_wait_ms {
            settings.ws.response_wait = Duration::from_millis(ms);
        }
        if let Some(reconnect) = gateway.reconnect {
            settings.ws.reconnect = reconnect;
        }
        if let Some(secs) = gateway.reconnect_delay_seconds {
            settings.ws.reconnect_delay = Duration::from_secs(secs);
        }
        if let Some(program) = &gateway.cli_program {
            settings.cli.program = program.clone();
        }
        if let Some(dir) = &gateway.cli_working_dir {
            settings.cli.working_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = gateway.cli_timeout_seconds {
            settings.cli.command_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = gateway.spawn_timeout_seconds {
            settings.cli.spawn_timeout = Duration::from_secs(secs);
        }

        let workflows = &config.workflows;
        if let Some(secs) = workflows.step_duration_connected_seconds {
            settings.timing.connected_step = Duration::from_secs(secs);
        }
        if let Some(secs) = workflows.step_duration_simulated_seconds {
            settings.timing.simulated_step = Duration::from_secs(secs);
        }
        settings.templates = workflows.templates.clone();

        if let Some(verbose) = config.logging.verbose {
            settings.verbose = verbose;
        }
        if let Some(json) = config.logging.json {
            settings.json_logs = json;
        }
        if let Some(monitor) = config.logging.monitor {
            settings.monitor = monitor;
        }

        if let Some(origins) = &config.cors.allowed_origins {
            settings.cors_origins = origins.clone();
        }

        Ok(settings)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| MissionControlError::InvalidConfigValueError {
                field: "server.host".to_string(),
                value: self.host.clone(),
                reason: format!("Not a valid listen address: {}", e),
            })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.host)?;
        self.socket_addr()?;
        validation::validate_positive_number("server.log_capacity", self.log_capacity, 1)?;
        validation::validate_range(
            "server.stats_interval_seconds",
            self.stats_interval.as_secs(),
            1,
            3600,
        )?;

        match self.gateway_mode {
            GatewayMode::WebSocket => validation::validate_ws_url("gateway.url", &self.ws.url)?,
            GatewayMode::Cli => {
                validation::validate_non_empty_string("gateway.cli_program", &self.cli.program)?;
                if let Some(dir) = &self.cli.working_dir {
                    validation::validate_path("gateway.cli_working_dir", &dir.to_string_lossy())?;
                }
            }
            GatewayMode::Offline => {}
        }

        for origin in &self.cors_origins {
            validation::validate_non_empty_string("cors.allowed_origins", origin)?;
        }

        Ok(())
    }
}
