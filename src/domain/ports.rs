use crate::domain::model::{GatewayStatus, Session, Subagent, SubagentRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Connection to an OpenClaw gateway.
///
/// Query methods return what the gateway last reported; counts are served from
/// the local cache so they never block.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Short name of the transport, used in logs.
    fn kind(&self) -> &'static str;

    fn endpoint(&self) -> String;

    fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<bool>;

    async fn disconnect(&self);

    async fn sessions(&self) -> Result<Vec<Session>>;

    async fn session(&self, session_id: &str) -> Result<Option<Session>>;

    async fn subagents(&self) -> Result<Vec<Subagent>>;

    async fn create_subagent(&self, request: &SubagentRequest) -> Result<Subagent>;

    async fn stop_subagent(&self, subagent_id: &str) -> Result<bool>;

    fn session_count(&self) -> usize;

    fn subagent_count(&self) -> usize;

    async fn status(&self) -> GatewayStatus;
}

/// What a runner needs to know to execute one workflow step.
#[derive(Debug, Clone)]
pub struct StepAssignment {
    pub workflow_name: String,
    pub step_name: String,
    pub agent_type: String,
    pub task_template: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub result: String,
    pub subagent_id: Option<String>,
}

#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn run_step(&self, assignment: &StepAssignment) -> Result<StepOutcome>;
}
