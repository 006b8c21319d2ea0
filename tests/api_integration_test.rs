//! Drives the HTTP API end to end against a real server bound to a random port,
//! with the gateway disabled so every gateway-backed endpoint serves simulated data.

use futures::StreamExt;
use mission_control::{Application, GatewayMode, Settings};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

struct TestServer {
    base: String,
    addr: SocketAddr,
    client: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn wait_for_status(&self, id: &str, expected: &str) -> Value {
        for _ in 0..100 {
            let (_, workflow) = self.get(&format!("/api/workflows/{}", id)).await;
            if workflow["status"] == expected {
                return workflow;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("workflow {} never reached status {}", id, expected);
    }
}

async fn start_server_with(step: Duration) -> TestServer {
    let mut settings = Settings {
        host: "127.0.0.1".to_string(),
        port: 0,
        gateway_mode: GatewayMode::Offline,
        stats_interval: Duration::from_millis(100),
        ..Default::default()
    };
    settings.timing.simulated_step = step;

    let app = Application::build(&settings);
    app.connect_gateway().await;

    let (tx, rx) = oneshot::channel::<()>();
    let (addr, _handle) = app
        .serve(settings.socket_addr().unwrap(), async {
            let _ = rx.await;
        })
        .await
        .unwrap();

    TestServer {
        base: format!("http://{}", addr),
        addr,
        client: reqwest::Client::new(),
        _shutdown: tx,
    }
}

async fn start_server() -> TestServer {
    start_server_with(Duration::from_millis(20)).await
}

#[tokio::test]
async fn test_root_and_status() {
    let server = start_server().await;

    let (status, root) = server.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["name"], "Mission Control API");
    assert_eq!(root["status"], "/api/status");

    let (_, api_status) = server.get("/api/status").await;
    assert_eq!(api_status["status"], "degraded");
    assert_eq!(api_status["openclaw_connected"], false);
    assert_eq!(api_status["version"], env!("CARGO_PKG_VERSION"));

    let (_, gateway) = server.get("/api/gateway/status").await;
    assert_eq!(gateway["connected"], false);
}

#[tokio::test]
async fn test_sessions_and_subagents_are_simulated_offline() {
    let server = start_server().await;

    let (status, sessions) = server.get("/api/sessions").await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["id"], "session-001");
    assert_eq!(sessions[0]["type"], "main");
    assert_eq!(sessions[1]["metadata"]["parent"], "session-001");

    let (status, body) = server.get("/api/sessions/session-001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Session not found");

    let (_, subagents) = server.get("/api/subagents").await;
    assert_eq!(subagents[0]["id"], "subagent-001");
}

#[tokio::test]
async fn test_subagent_lifecycle_offline() {
    let server = start_server().await;

    let (status, created) = server
        .post("/api/subagents", json!({"task": "Summarise the changelog", "label": "Scribe"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "simulated");
    assert_eq!(created["label"], "Scribe");
    assert!(created["id"].as_str().unwrap().starts_with("subagent-"));

    let (status, body) = server.post("/api/subagents", json!({"task": ""})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    // Only an empty task is rejected; whitespace is a task like any other
    let (status, blank) = server.post("/api/subagents", json!({"task": "   "})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blank["task"], "   ");

    let (status, _) = server.post("/api/subagents", json!({"label": "no task"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = server
        .client
        .delete(server.url("/api/subagents/subagent-001"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("simulated"));
}

#[tokio::test]
async fn test_workflow_runs_to_completion() {
    let server = start_server().await;

    let (status, templates) = server.get("/api/workflows/templates/list").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = templates
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"ci-cd"));
    assert!(ids.contains(&"analise-codigo"));
    assert!(ids.contains(&"suporte"));

    let (status, workflow) = server
        .post(
            "/api/workflows",
            json!({"name": "Release 3.1", "team": "platform", "template": "ci-cd"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(workflow["status"], "pendente");
    assert_eq!(workflow["progress"], 0);
    assert_eq!(workflow["duration"], "0m 0s");
    assert_eq!(workflow["steps"].as_array().unwrap().len(), 4);
    let id = workflow["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("wf-"));

    let (status, started) = server
        .post(&format!("/api/workflows/{}/start", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["success"], true);

    let finished = server.wait_for_status(&id, "concluido").await;
    assert_eq!(finished["progress"], 100);
    assert!(finished["completed_at"].is_string());
    for step in finished["steps"].as_array().unwrap() {
        assert_eq!(step["status"], "concluido");
        assert_eq!(step["result"], "Completed successfully");
    }

    let (_, stats) = server.get("/api/stats").await;
    assert_eq!(stats["workflows_total"], 1);
    assert_eq!(stats["workflows_completed"], 1);
    assert_eq!(stats["sessions_active"], 0);
}

#[tokio::test]
async fn test_workflow_conflicts_and_cancel() {
    let server = start_server_with(Duration::from_secs(5)).await;

    let (_, workflow) = server
        .post(
            "/api/workflows",
            json!({"name": "Night shift", "template": "suporte", "auto_start": true}),
        )
        .await;
    let id = workflow["id"].as_str().unwrap().to_string();
    assert_eq!(workflow["status"], "em_andamento");

    let (status, body) = server
        .post(&format!("/api/workflows/{}/start", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].is_string());

    let (status, _) = server
        .post(&format!("/api/workflows/{}/cancel", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, cancelled) = server.get(&format!("/api/workflows/{}", id)).await;
    assert_eq!(cancelled["status"], "cancelado");
    let last_log = cancelled["logs"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last_log["level"], "warning");

    let (status, body) = server
        .post("/api/workflows/wf-missing/cancel", json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Workflow not found");

    let (status, _) = server
        .post("/api/workflows/wf-missing/start", json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_workflow_validation_and_listing() {
    let server = start_server().await;

    let (status, _) = server.post("/api/workflows", json!({"name": ""})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = server
        .post("/api/workflows", json!({"name": "x".repeat(101)}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    for name in ["First", "Second", "Third"] {
        let (status, _) = server.post("/api/workflows", json!({"name": name})).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, all) = server.get("/api/workflows").await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, limited) = server.get("/api/workflows?limit=2").await;
    assert_eq!(limited.as_array().unwrap().len(), 2);

    let (_, running) = server.get("/api/workflows?status=em_andamento").await;
    assert!(running.as_array().unwrap().is_empty());

    let (_, unknown_filter) = server.get("/api/workflows?status=whatever").await;
    assert_eq!(unknown_filter.as_array().unwrap().len(), 3);

    let (status, body) = server.get("/api/workflows/wf-nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Workflow not found");
}

#[tokio::test]
async fn test_system_logs() {
    let server = start_server().await;

    let (status, body) = server
        .post("/api/logs", json!({"level": "info", "message": "deploy finished"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    server
        .post("/api/logs", json!({"level": "error", "message": "disk full", "source": "monitor", "time": "12:00:00"}))
        .await;

    let (_, external) = server.get("/api/logs?source=external").await;
    let external = external.as_array().unwrap();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0]["message"], "deploy finished");
    assert_eq!(external[0]["time"].as_str().unwrap().len(), 8);

    let (_, monitor) = server.get("/api/logs?source=monitor").await;
    assert_eq!(monitor[0]["time"], "12:00:00");

    // Startup entry plus the two posted entries
    let (_, all) = server.get("/api/logs").await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, last) = server.get("/api/logs?limit=1").await;
    assert_eq!(last[0]["message"], "disk full");

    let (_, unlimited) = server.get("/api/logs?limit=0").await;
    assert_eq!(unlimited.as_array().unwrap().len(), 3);

    let (status, _) = server.post("/api/logs", json!({"message": "no level"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let server = start_server().await;

    let response = server
        .client
        .get(server.url("/api/status"))
        .header("Origin", "http://dashboard.example")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_websocket_pushes_stats() {
    let server = start_server().await;

    let url = format!("ws://{}/ws", server.addr);
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    for _ in 0..2 {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for stats")
            .unwrap()
            .unwrap();
        let Message::Text(text) = message else {
            panic!("expected a text frame, got {:?}", message);
        };
        let frame: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(frame["type"], "stats_update");
        assert_eq!(frame["data"]["workflows_total"], 0);
        assert!(frame["data"]["timestamp"].is_string());
    }

    socket.close(None).await.unwrap();
}
