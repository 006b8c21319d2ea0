use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ISO-8601 timestamp in local time.
pub fn timestamp() -> String {
    Local::now().to_rfc3339()
}

/// Wall-clock time used by log entries, `HH:MM:SS`.
pub fn clock() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Session {
    /// Builds a session from a raw gateway payload, tolerating missing fields.
    pub fn from_gateway(raw: &Value, fallback_id: &str) -> Self {
        Self {
            id: str_field(raw, "id").unwrap_or_else(|| fallback_id.to_string()),
            kind: str_field(raw, "type").unwrap_or_else(|| "unknown".to_string()),
            status: str_field(raw, "status").unwrap_or_else(|| "unknown".to_string()),
            created_at: str_field(raw, "created_at"),
            metadata: raw
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subagent {
    pub id: String,
    pub status: String,
    pub task: String,
    pub label: Option<String>,
    pub created_at: String,
    pub model: Option<String>,
}

impl Subagent {
    pub fn from_gateway(raw: &Value) -> Self {
        Self {
            id: str_field(raw, "id").unwrap_or_else(|| "unknown".to_string()),
            status: str_field(raw, "status").unwrap_or_else(|| "unknown".to_string()),
            task: str_field(raw, "task").unwrap_or_default(),
            label: str_field(raw, "label"),
            created_at: str_field(raw, "created_at").unwrap_or_else(timestamp),
            model: str_field(raw, "model"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubagentRequest {
    pub task: String,
    pub label: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub time: String,
    pub level: String,
    pub message: String,
    pub source: Option<String>,
}

impl LogEntry {
    pub fn new(level: &str, message: impl Into<String>, source: &str) -> Self {
        Self {
            time: clock(),
            level: level.to_string(),
            message: message.into(),
            source: Some(source.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub workflows_total: usize,
    pub workflows_running: usize,
    pub workflows_completed: usize,
    pub workflows_failed: usize,
    pub subagents_active: usize,
    pub sessions_active: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub openclaw_connected: bool,
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub connected: bool,
    pub gateway_url: String,
    pub active_sessions: usize,
    pub active_subagents: usize,
    pub timestamp: String,
}

fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}
