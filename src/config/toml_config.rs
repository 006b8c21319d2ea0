use crate::core::templates::WorkflowTemplate;
use crate::utils::error::{MissionControlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional configuration file. Every section and key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub workflows: WorkflowsSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub cors: CorsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub stats_interval_seconds: Option<u64>,
    pub log_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewaySection {
    pub mode: Option<String>,
    pub url: Option<String>,
    pub connect_timeout_seconds: Option<u64>,
    pub response_wait_ms: Option<u64>,
    pub reconnect: Option<bool>,
    pub reconnect_delay_seconds: Option<u64>,
    pub cli_program: Option<String>,
    pub cli_working_dir: Option<String>,
    pub cli_timeout_seconds: Option<u64>,
    pub spawn_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowsSection {
    pub step_duration_connected_seconds: Option<u64>,
    pub step_duration_simulated_seconds: Option<u64>,
    #[serde(default)]
    pub templates: Vec<WorkflowTemplate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
    pub monitor: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsSection {
    pub allowed_origins: Option<Vec<String>>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MissionControlError::config(format!(
                "cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed)?)
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| MissionControlError::config(format!("bad substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.gateway.url {
            validation::validate_ws_url("gateway.url", url)?;
        }
        if let Some(dir) = &self.gateway.cli_working_dir {
            validation::validate_path("gateway.cli_working_dir", dir)?;
        }
        if let Some(capacity) = self.server.log_capacity {
            validation::validate_positive_number("server.log_capacity", capacity, 1)?;
        }

        for template in &self.workflows.templates {
            validation::validate_non_empty_string("workflows.templates.id", &template.id)?;
            if template.steps.is_empty() {
                return Err(MissionControlError::InvalidConfigValueError {
                    field: "workflows.templates.steps".to_string(),
                    value: template.id.clone(),
                    reason: "Template must declare at least one step".to_string(),
                });
            }

            let mut seen: Vec<&str> = Vec::new();
            for step in &template.steps {
                if let Some(missing) = step.depends_on.iter().find(|d| !seen.contains(&d.as_str())) {
                    return Err(MissionControlError::InvalidConfigValueError {
                        field: format!("workflows.templates.{}.steps", template.id),
                        value: missing.clone(),
                        reason: format!(
                            "Step '{}' depends on a step that is not declared before it",
                            step.name
                        ),
                    });
                }
                seen.push(step.name.as_str());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 9000
stats_interval_seconds = 1

[gateway]
mode = "cli"
url = "ws://gateway.local:18789"
cli_working_dir = "/srv/openclaw"

[workflows]
step_duration_simulated_seconds = 0

[[workflows.templates]]
id = "release"
name = "Release"

[[workflows.templates.steps]]
name = "Tag"

[[workflows.templates.steps]]
name = "Publish"
depends_on = ["Tag"]

[cors]
allowed_origins = ["http://localhost:3000"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.port, Some(9000));
        assert_eq!(config.gateway.mode.as_deref(), Some("cli"));
        assert_eq!(config.workflows.templates.len(), 1);
        assert_eq!(config.workflows.templates[0].steps[1].depends_on, vec!["Tag"]);
        assert_eq!(config.workflows.templates[0].steps[0].agent_type, "assistente");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.server.host.is_none());
        assert!(config.workflows.templates.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MC_TEST_GATEWAY_URL", "ws://10.0.0.5:18789");

        let config = TomlConfig::from_toml_str(
            r#"
[gateway]
url = "${MC_TEST_GATEWAY_URL}"
cli_program = "${MC_TEST_UNSET_PROGRAM}"
"#,
        )
        .unwrap();

        assert_eq!(config.gateway.url.as_deref(), Some("ws://10.0.0.5:18789"));
        assert_eq!(
            config.gateway.cli_program.as_deref(),
            Some("${MC_TEST_UNSET_PROGRAM}")
        );

        std::env::remove_var("MC_TEST_GATEWAY_URL");
    }

    #[test]
    fn test_config_validation() {
        let bad_url = TomlConfig::from_toml_str("[gateway]\nurl = \"http://gateway\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let forward_dependency = TomlConfig::from_toml_str(
            r#"
[[workflows.templates]]
id = "broken"
name = "Broken"

[[workflows.templates.steps]]
name = "First"
depends_on = ["Second"]

[[workflows.templates.steps]]
name = "Second"
"#,
        )
        .unwrap();
        assert!(forward_dependency.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let err = TomlConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, MissionControlError::TomlError(_)));
    }

    #[test]
    fn test_shipped_example_config() {
        let config = TomlConfig::from_toml_str(include_str!("../../mission-control.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, Some(8000));
        assert_eq!(config.workflows.templates[0].id, "release");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 8100\n\n[logging]\njson = true\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.port, Some(8100));
        assert_eq!(config.logging.json, Some(true));

        assert!(TomlConfig::from_file("/nonexistent/mission-control.toml").is_err());
    }
}
