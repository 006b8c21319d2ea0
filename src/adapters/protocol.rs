//! OpenClaw gateway wire protocol.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const CLIENT_NAME: &str = "mission-control-api";

/// Frames sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Identify {
        client: String,
        version: String,
    },
    GetSessions,
    GetSession {
        session_id: String,
    },
    GetSubagents,
    SpawnSubagent {
        subagent_id: String,
        task: String,
        label: String,
        model: String,
    },
    StopSubagent {
        subagent_id: String,
    },
    GetStatus,
    GetLogs {
        limit: usize,
    },
}

impl ClientMessage {
    pub fn identify() -> Self {
        Self::Identify {
            client: CLIENT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing a plain enum of strings cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Frames received from the gateway that update local state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    SessionList {
        #[serde(default)]
        sessions: Vec<Value>,
    },
    SessionUpdate {
        session_id: Option<String>,
        #[serde(default)]
        data: Value,
    },
    SubagentList {
        #[serde(default)]
        subagents: Vec<Value>,
    },
    SubagentUpdate {
        subagent_id: Option<String>,
        status: Option<String>,
        #[serde(default)]
        data: Value,
    },
    SubagentCreated {
        subagent_id: Option<String>,
        #[serde(default)]
        data: Value,
    },
    #[serde(other)]
    Other,
}

impl GatewayEvent {
    /// Frames that are not a known event, or carry no `type`, map to `Other`.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(Self::Other)
    }
}

/// Last known sessions and subagents, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct GatewayCache {
    pub sessions: HashMap<String, Value>,
    pub subagents: HashMap<String, Value>,
}

impl GatewayCache {
    pub fn apply(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::SessionList { sessions } => {
                self.sessions = index_by_id(sessions);
            }
            GatewayEvent::SessionUpdate {
                session_id: Some(id),
                data,
            } => {
                self.sessions.insert(id, object_or_empty(data));
            }
            GatewayEvent::SubagentList { subagents } => {
                self.subagents = index_by_id(subagents);
            }
            GatewayEvent::SubagentUpdate {
                subagent_id: Some(id),
                status,
                data,
            } => {
                if status.as_deref() == Some("stopped") {
                    self.subagents.remove(&id);
                } else {
                    self.subagents.insert(id, object_or_empty(data));
                }
            }
            GatewayEvent::SubagentCreated {
                subagent_id: Some(id),
                data,
            } => {
                self.subagents.insert(id, object_or_empty(data));
            }
            _ => {}
        }
    }
}

fn index_by_id(items: Vec<Value>) -> HashMap<String, Value> {
    items
        .into_iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(Value::as_str)?.to_string();
            Some((id, item))
        })
        .collect()
}

fn object_or_empty(data: Value) -> Value {
    if data.is_object() {
        data
    } else {
        Value::Object(Default::default())
    }
}
