//! Gateway backed by the `openclaw` command-line tool.

use crate::domain::model::{timestamp, GatewayStatus, Session, Subagent, SubagentRequest};
use crate::domain::ports::AgentGateway;
use crate::utils::error::{MissionControlError, Result};
use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::process::Command;

const LIST_ARGS: [&str; 6] = ["sessions", "list", "--kinds", "subagent", "--limit", "20"];
const TASK_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct CliGatewayConfig {
    pub program: String,
    pub working_dir: Option<PathBuf>,
    pub command_timeout: Duration,
    /// Passed to `sessions spawn --timeout`.
    pub spawn_timeout: Duration,
}

impl Default for CliGatewayConfig {
    fn default() -> Self {
        Self {
            program: "openclaw".to_string(),
            working_dir: None,
            command_timeout: Duration::from_secs(30),
            spawn_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug)]
struct CommandOutput {
    stdout: String,
    stderr: String,
    success: bool,
}

pub struct CliGateway {
    config: CliGatewayConfig,
    available: AtomicBool,
    sessions_seen: AtomicUsize,
    subagents_seen: AtomicUsize,
}

impl CliGateway {
    pub fn new(config: CliGatewayConfig) -> Self {
        Self {
            config,
            available: AtomicBool::new(false),
            sessions_seen: AtomicUsize::new(0),
            subagents_seen: AtomicUsize::new(0),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let command = format!("{} {}", self.config.program, args.join(" "));
        tracing::debug!("Running: {}", command);

        let output = tokio::time::timeout(self.config.command_timeout, cmd.output())
            .await
            .map_err(|_| MissionControlError::Timeout {
                operation: command.clone(),
                seconds: self.config.command_timeout.as_secs(),
            })?
            .map_err(|e| MissionControlError::GatewayCommandError {
                command: command.clone(),
                details: e.to_string(),
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }

    async fn list_output(&self) -> Result<String> {
        let output = self.run(&LIST_ARGS).await?;
        if !output.success {
            tracing::error!("Failed to list sessions: {}", output.stderr.trim());
            return Err(MissionControlError::GatewayCommandError {
                command: format!("{} {}", self.config.program, LIST_ARGS.join(" ")),
                details: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl AgentGateway for CliGateway {
    fn kind(&self) -> &'static str {
        "cli"
    }

    fn endpoint(&self) -> String {
        match &self.config.working_dir {
            Some(dir) => format!("cli://{} ({})", self.config.program, dir.display()),
            None => format!("cli://{}", self.config.program),
        }
    }

    fn is_connected(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<bool> {
        let available = match self.run(&["--version"]).await {
            Ok(output) => output.success,
            Err(e) => {
                tracing::warn!("openclaw CLI not available: {}", e);
                false
            }
        };
        self.available.store(available, Ordering::SeqCst);
        Ok(available)
    }

    async fn disconnect(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        let sessions = parse_sessions(&self.list_output().await?);
        self.sessions_seen.store(sessions.len(), Ordering::SeqCst);
        Ok(sessions)
    }

    async fn session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions().await?.into_iter().find(|s| s.id == session_id))
    }

    async fn subagents(&self) -> Result<Vec<Subagent>> {
        // A failed listing still yields whatever was printed
        let stdout = self.run(&LIST_ARGS).await?.stdout;
        let subagents = parse_subagents(&stdout);
        self.subagents_seen.store(subagents.len(), Ordering::SeqCst);
        Ok(subagents)
    }

    async fn create_subagent(&self, request: &SubagentRequest) -> Result<Subagent> {
        let label = request
            .label
            .clone()
            .unwrap_or_else(|| format!("subagent-{}", Local::now().format("%H%M%S")));
        let timeout = self.config.spawn_timeout.as_secs().to_string();
        let args = [
            "sessions",
            "spawn",
            "--task",
            request.task.as_str(),
            "--label",
            label.as_str(),
            "--timeout",
            timeout.as_str(),
        ];

        let output = self.run(&args).await?;
        if !output.success {
            return Err(MissionControlError::GatewayCommandError {
                command: format!("{} sessions spawn", self.config.program),
                details: output.stderr.trim().to_string(),
            });
        }

        tracing::info!("Spawned subagent '{}' via CLI", label);
        Ok(Subagent {
            id: label.clone(),
            status: "created".to_string(),
            task: request.task.clone(),
            label: Some(label),
            created_at: timestamp(),
            model: request.model.clone(),
        })
    }

    async fn stop_subagent(&self, subagent_id: &str) -> Result<bool> {
        tracing::info!(
            "openclaw has no stop command; subagent {} will finish on its own",
            subagent_id
        );
        Ok(true)
    }

    fn session_count(&self) -> usize {
        self.sessions_seen.load(Ordering::SeqCst)
    }

    fn subagent_count(&self) -> usize {
        self.subagents_seen.load(Ordering::SeqCst)
    }

    async fn status(&self) -> GatewayStatus {
        let connected = self.connect().await.unwrap_or(false);
        GatewayStatus {
            connected,
            gateway_url: self.endpoint(),
            active_sessions: self.session_count(),
            active_subagents: self.subagent_count(),
            timestamp: timestamp(),
        }
    }
}

/// `agent:` lines from `sessions list`, keyed by their first token.
pub fn parse_sessions(stdout: &str) -> Vec<Session> {
    stdout
        .lines()
        .filter(|line| line.starts_with("agent:"))
        .map(|line| {
            let key = line.split_whitespace().next().unwrap_or("unknown");
            let mut metadata = Map::new();
            metadata.insert("display_name".to_string(), json!(display_name(line)));
            metadata.insert("total_tokens".to_string(), json!(0));
            metadata.insert("active".to_string(), Value::Bool(true));
            Session {
                id: key.to_string(),
                kind: "subagent".to_string(),
                status: "active".to_string(),
                created_at: None,
                metadata,
            }
        })
        .collect()
}

/// Every listing line that mentions a subagent or is an `agent:` line.
pub fn parse_subagents(stdout: &str) -> Vec<Subagent> {
    stdout
        .trim()
        .lines()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains("subagent") || line.starts_with("agent:"))
        .map(|(i, line)| Subagent {
            id: format!("subagent-{}", i),
            status: "running".to_string(),
            task: preview(line),
            label: None,
            created_at: timestamp(),
            model: None,
        })
        .collect()
}

fn display_name(line: &str) -> String {
    line.split_once("displayName=")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or("Unknown")
        .to_string()
}

fn preview(line: &str) -> String {
    if line.chars().count() > TASK_PREVIEW_CHARS {
        let head: String = line.chars().take(TASK_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Sessions (2)
agent:main:subagent:abc displayName=Reviewer tokens=120
agent:main:subagent:def kind=subagent
";

    #[test]
    fn test_parse_sessions() {
        let sessions = parse_sessions(LISTING);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "agent:main:subagent:abc");
        assert_eq!(sessions[0].metadata["display_name"], "Reviewer");
        assert_eq!(sessions[1].metadata["display_name"], "Unknown");
        assert_eq!(sessions[1].kind, "subagent");
    }

    #[test]
    fn test_parse_subagents_uses_line_index() {
        let subagents = parse_subagents(LISTING);
        assert_eq!(subagents.len(), 2);
        assert_eq!(subagents[0].id, "subagent-1");
        assert_eq!(subagents[1].id, "subagent-2");
        assert!(subagents[0].task.ends_with("..."));
        assert_eq!(subagents[0].task.chars().count(), TASK_PREVIEW_CHARS + 3);
        assert_eq!(subagents[1].task, "agent:main:subagent:def kind=subagent");
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_sessions("").is_empty());
        assert!(parse_subagents("").is_empty());
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let gateway = CliGateway::new(CliGatewayConfig {
            program: "openclaw-does-not-exist".to_string(),
            ..Default::default()
        });

        assert!(!gateway.connect().await.unwrap());
        assert!(!gateway.is_connected());
        assert!(gateway.sessions().await.is_err());
        assert!(gateway.stop_subagent("anything").await.unwrap());
    }
}
