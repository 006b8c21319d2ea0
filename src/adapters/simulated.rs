//! Canned data served while no gateway is connected, so the dashboard stays usable.

use crate::domain::model::{timestamp, Session, Subagent, SubagentRequest};
use chrono::Local;
use serde_json::{json, Map, Value};

pub fn sessions() -> Vec<Session> {
    vec![
        fixture_session("session-001", "main", "channel", json!("telegram")),
        fixture_session("session-002", "subagent", "parent", json!("session-001")),
    ]
}

pub fn subagents() -> Vec<Subagent> {
    vec![Subagent {
        id: "subagent-001".to_string(),
        status: "running".to_string(),
        task: "Code analysis".to_string(),
        label: Some("Reviewer".to_string()),
        created_at: timestamp(),
        model: Some("default".to_string()),
    }]
}

/// Echoes the request back as a subagent that was never actually spawned.
pub fn spawn(request: &SubagentRequest) -> Subagent {
    Subagent {
        id: format!("subagent-{}", Local::now().format("%Y%m%d-%H%M%S")),
        status: "simulated".to_string(),
        task: request.task.clone(),
        label: request.label.clone(),
        created_at: timestamp(),
        model: request.model.clone(),
    }
}

fn fixture_session(id: &str, kind: &str, key: &str, value: Value) -> Session {
    let mut metadata = Map::new();
    metadata.insert(key.to_string(), value);
    Session {
        id: id.to_string(),
        kind: kind.to_string(),
        status: "active".to_string(),
        created_at: Some(timestamp()),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_sessions_link_parent() {
        let sessions = sessions();
        assert_eq!(sessions[0].id, "session-001");
        assert_eq!(sessions[1].metadata["parent"], "session-001");
    }

    #[test]
    fn test_spawn_marks_simulated() {
        let subagent = spawn(&SubagentRequest {
            task: "Write docs".to_string(),
            label: Some("Docs".to_string()),
            model: None,
        });
        assert_eq!(subagent.status, "simulated");
        assert!(subagent.id.starts_with("subagent-"));
        assert_eq!(subagent.label.as_deref(), Some("Docs"));
    }
}
