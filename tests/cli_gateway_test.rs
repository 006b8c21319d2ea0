//! CLI gateway against a stand-in `openclaw` shell script.
#![cfg(unix)]

use mission_control::adapters::{CliGateway, CliGatewayConfig};
use mission_control::domain::model::SubagentRequest;
use mission_control::domain::ports::AgentGateway;
use mission_control::MissionControlError;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const FAKE_OPENCLAW: &str = r#"#!/bin/sh
case "$1" in
  --version)
    echo "openclaw 0.9.0"
    ;;
  sessions)
    case "$2" in
      list)
        echo "Sessions (subagent)"
        echo "agent:main:subagent:7f3a displayName=Reviewer tokens=1200"
        echo "agent:main:subagent:9c1d tokens=40"
        ;;
      spawn)
        shift 2
        echo "$@" > spawn-args.txt
        echo "spawned"
        ;;
    esac
    ;;
  *)
    exit 1
    ;;
esac
"#;

const BROKEN_OPENCLAW: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  exit 0
fi
echo "subagent listing unavailable"
echo "gateway offline" >&2
exit 2
"#;

const SLOW_OPENCLAW: &str = "#!/bin/sh\nsleep 5\n";

fn install_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("openclaw");
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn gateway(dir: &TempDir, body: &str) -> CliGateway {
    let program = install_script(dir.path(), body);
    CliGateway::new(CliGatewayConfig {
        program: program.to_string_lossy().to_string(),
        working_dir: Some(dir.path().to_path_buf()),
        command_timeout: Duration::from_secs(5),
        spawn_timeout: Duration::from_secs(120),
    })
}

#[tokio::test]
async fn test_cli_gateway_lists_and_spawns() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir, FAKE_OPENCLAW);

    assert!(gateway.connect().await.unwrap());
    assert!(gateway.is_connected());
    assert_eq!(gateway.kind(), "cli");

    let sessions = gateway.sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "agent:main:subagent:7f3a");
    assert_eq!(sessions[0].metadata["display_name"], "Reviewer");
    assert_eq!(sessions[1].metadata["display_name"], "Unknown");
    assert_eq!(gateway.session_count(), 2);

    let found = gateway.session("agent:main:subagent:9c1d").await.unwrap();
    assert!(found.is_some());

    // The header line mentions "subagent" too
    let subagents = gateway.subagents().await.unwrap();
    assert_eq!(subagents.len(), 3);
    assert_eq!(subagents[1].id, "subagent-1");

    let spawned = gateway
        .create_subagent(&SubagentRequest {
            task: "Triage open issues".to_string(),
            label: Some("triage".to_string()),
            model: None,
        })
        .await
        .unwrap();
    assert_eq!(spawned.id, "triage");
    assert_eq!(spawned.status, "created");

    // Written relative to the configured working directory
    let args = std::fs::read_to_string(dir.path().join("spawn-args.txt")).unwrap();
    assert_eq!(args.trim(), "--task Triage open issues --label triage --timeout 120");

    assert!(gateway.stop_subagent("triage").await.unwrap());

    let status = gateway.status().await;
    assert!(status.connected);
    assert_eq!(status.active_sessions, 2);
}

#[tokio::test]
async fn test_cli_gateway_default_label() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir, FAKE_OPENCLAW);

    let spawned = gateway
        .create_subagent(&SubagentRequest {
            task: "Nightly report".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let suffix = spawned.id.strip_prefix("subagent-").unwrap();
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_cli_gateway_failures() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir, BROKEN_OPENCLAW);

    assert!(gateway.connect().await.unwrap());

    let err = gateway.sessions().await.unwrap_err();
    match err {
        MissionControlError::GatewayCommandError { details, .. } => {
            assert_eq!(details, "gateway offline")
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Listing output is used even when the command fails
    assert_eq!(gateway.subagents().await.unwrap().len(), 1);

    let spawn = gateway
        .create_subagent(&SubagentRequest {
            task: "anything".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(
        spawn,
        Err(MissionControlError::GatewayCommandError { .. })
    ));
}

#[tokio::test]
async fn test_cli_gateway_times_out() {
    let dir = TempDir::new().unwrap();
    let program = install_script(dir.path(), SLOW_OPENCLAW);
    let gateway = CliGateway::new(CliGatewayConfig {
        program: program.to_string_lossy().to_string(),
        working_dir: None,
        command_timeout: Duration::from_millis(200),
        ..Default::default()
    });

    let err = gateway.sessions().await.unwrap_err();
    assert!(matches!(err, MissionControlError::Timeout { .. }));
    assert!(!gateway.connect().await.unwrap());
}
