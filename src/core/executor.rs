use crate::domain::model::SubagentRequest;
use crate::domain::ports::{AgentGateway, StepAssignment, StepOutcome, StepRunner};
use crate::utils::error::{MissionControlError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub const STEP_RESULT_OK: &str = "Completed successfully";

/// How long a step is considered to take once dispatched.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionTiming {
    pub connected_step: Duration,
    pub simulated_step: Duration,
}

impl Default for ExecutionTiming {
    fn default() -> Self {
        Self {
            connected_step: Duration::from_secs(5),
            simulated_step: Duration::from_secs(2),
        }
    }
}

/// Runs steps by spawning a subagent on the gateway, or simulates them when
/// no gateway is connected.
pub struct AgentStepRunner {
    gateway: Option<Arc<dyn AgentGateway>>,
    timing: ExecutionTiming,
}

impl AgentStepRunner {
    pub fn new(gateway: Option<Arc<dyn AgentGateway>>, timing: ExecutionTiming) -> Self {
        Self { gateway, timing }
    }

    fn connected_gateway(&self) -> Option<&Arc<dyn AgentGateway>> {
        self.gateway.as_ref().filter(|g| g.is_connected())
    }

    async fn dispatch(&self, assignment: &StepAssignment) -> Result<StepOutcome> {
        let Some(gateway) = self.connected_gateway() else {
            tracing::debug!("Simulating step '{}'", assignment.step_name);
            tokio::time::sleep(self.timing.simulated_step).await;
            return Ok(StepOutcome {
                result: STEP_RESULT_OK.to_string(),
                subagent_id: None,
            });
        };

        let request = SubagentRequest {
            task: assignment.task_template.clone(),
            label: Some(format!("{} - {}", assignment.workflow_name, assignment.step_name)),
            model: None,
        };
        let subagent = gateway.create_subagent(&request).await?;
        tracing::info!(
            "Step '{}' dispatched to subagent {} ({})",
            assignment.step_name,
            subagent.id,
            assignment.agent_type
        );

        // The gateway does not report completion; the step is given a fixed window.
        tokio::time::sleep(self.timing.connected_step).await;

        Ok(StepOutcome {
            result: STEP_RESULT_OK.to_string(),
            subagent_id: Some(subagent.id),
        })
    }
}

#[async_trait]
impl StepRunner for AgentStepRunner {
    async fn run_step(&self, assignment: &StepAssignment) -> Result<StepOutcome> {
        match tokio::time::timeout(assignment.timeout, self.dispatch(assignment)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(MissionControlError::Timeout {
                operation: format!("step '{}'", assignment.step_name),
                seconds: assignment.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(timeout: Duration) -> StepAssignment {
        StepAssignment {
            workflow_name: "Release".to_string(),
            step_name: "Build".to_string(),
            agent_type: "assistente".to_string(),
            task_template: "Build it".to_string(),
            timeout,
        }
    }

    #[tokio::test]
    async fn test_simulated_step_without_gateway() {
        let runner = AgentStepRunner::new(
            None,
            ExecutionTiming {
                connected_step: Duration::from_millis(1),
                simulated_step: Duration::from_millis(1),
            },
        );

        let outcome = runner.run_step(&assignment(Duration::from_secs(1))).await.unwrap();
        assert_eq!(outcome.result, STEP_RESULT_OK);
        assert!(outcome.subagent_id.is_none());
    }

    #[tokio::test]
    async fn test_step_timeout() {
        let runner = AgentStepRunner::new(
            None,
            ExecutionTiming {
                connected_step: Duration::from_secs(10),
                simulated_step: Duration::from_secs(10),
            },
        );

        let err = runner
            .run_step(&assignment(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, MissionControlError::Timeout { .. }));
    }
}
