use thiserror::Error;

#[derive(Error, Debug)]
pub enum MissionControlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Gateway unavailable: {message}")]
    GatewayUnavailable { message: String },

    #[error("Gateway command '{command}' failed: {details}")]
    GatewayCommandError { command: String, details: String },

    #[error("Workflow not found: {id}")]
    WorkflowNotFound { id: String },

    #[error("Workflow already running: {id}")]
    WorkflowAlreadyRunning { id: String },

    #[error("Step '{step}' failed: {details}")]
    StepExecutionError { step: String, details: String },

    #[error("Operation timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Gateway,
    Workflow,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MissionControlError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::WebSocketError(_)
            | Self::GatewayUnavailable { .. }
            | Self::GatewayCommandError { .. }
            | Self::Timeout { .. } => ErrorCategory::Gateway,
            Self::WorkflowNotFound { .. }
            | Self::WorkflowAlreadyRunning { .. }
            | Self::StepExecutionError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Workflow,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::WorkflowAlreadyRunning { .. } | Self::WorkflowNotFound { .. } => {
                ErrorSeverity::Low
            }
            Self::GatewayUnavailable { .. } | Self::Timeout { .. } | Self::WebSocketError(_) => {
                ErrorSeverity::Medium
            }
            Self::ValidationError { .. }
            | Self::StepExecutionError { .. }
            | Self::GatewayCommandError { .. }
            | Self::SerializationError(_) => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::TomlError(_)
            | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the config file and command-line flags, then restart the service"
            }
            ErrorCategory::Gateway => {
                "Make sure the OpenClaw gateway is running and reachable at the configured URL"
            }
            ErrorCategory::Workflow => "Check the workflow id and its current status",
            ErrorCategory::Io => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
            Self::GatewayUnavailable { .. } | Self::WebSocketError(_) => {
                "Could not talk to the OpenClaw gateway".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MissionControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical() {
        let err = MissionControlError::MissingConfigError {
            field: "gateway.url".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("gateway.url"));
    }

    #[test]
    fn test_gateway_errors_are_recoverable() {
        let err = MissionControlError::GatewayUnavailable {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Gateway);
        assert!(err.severity() < ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("gateway"));
    }
}
