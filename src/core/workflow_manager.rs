use crate::core::templates::{TemplateCatalog, TemplateSummary};
use crate::core::workflow::{StepStatus, Workflow, WorkflowStatus};
use crate::domain::ports::{StepAssignment, StepRunner};
use crate::utils::error::{MissionControlError, Result};
use crate::utils::validation::validate_length;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct NewWorkflow {
    pub name: String,
    pub description: String,
    pub team: String,
    pub template: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Owns every workflow and the background tasks executing them.
pub struct WorkflowManager {
    workflows: RwLock<HashMap<String, Workflow>>,
    running: Mutex<HashMap<String, JoinHandle<()>>>,
    templates: TemplateCatalog,
    runner: Arc<dyn StepRunner>,
}

impl WorkflowManager {
    pub fn new(templates: TemplateCatalog, runner: Arc<dyn StepRunner>) -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            running: Mutex::new(HashMap::new()),
            templates,
            runner,
        }
    }

    pub async fn create(&self, request: NewWorkflow) -> Result<Workflow> {
        validate_length("name", &request.name, 1, MAX_NAME_LENGTH)?;

        let mut workflow = Workflow::new(
            &request.name,
            &request.description,
            &request.team,
            &request.created_by,
        );

        if let Some(template_id) = request.template.as_deref() {
            match self.templates.get(template_id) {
                Some(template) => {
                    if workflow.description.is_empty() {
                        workflow.description = template.description.clone();
                    }
                    for step in template.build_steps() {
                        workflow.add_step(step);
                    }
                }
                None => tracing::warn!("Unknown workflow template '{}', creating empty workflow", template_id),
            }
        }

        workflow.add_log("info", format!("Workflow '{}' created", request.name));
        tracing::info!("Workflow created: {} ({} steps)", workflow.id, workflow.steps.len());

        self.workflows
            .write()
            .await
            .insert(workflow.id.clone(), workflow.clone());

        Ok(workflow)
    }

    pub async fn get(&self, id: &str) -> Option<Workflow> {
        self.workflows.read().await.get(id).cloned()
    }

    /// Newest first.
    pub async fn list(&self, status: Option<WorkflowStatus>, limit: usize) -> Vec<Workflow> {
        let workflows = self.workflows.read().await;
        let mut matching: Vec<Workflow> = workflows
            .values()
            .filter(|w| status.map_or(true, |s| w.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        matching
    }

    /// Marks the workflow running and executes its steps in the background.
    ///
    /// A finished workflow can be started again; its steps are reset first.
    pub async fn start(self: &Arc<Self>, id: &str) -> Result<()> {
        {
            let mut workflows = self.workflows.write().await;
            let workflow = workflows
                .get_mut(id)
                .ok_or_else(|| MissionControlError::WorkflowNotFound { id: id.to_string() })?;

            if workflow.status == WorkflowStatus::Running {
                tracing::warn!("Workflow {} is already running", id);
                return Err(MissionControlError::WorkflowAlreadyRunning { id: id.to_string() });
            }

            if workflow.status.is_terminal() {
                for step in &mut workflow.steps {
                    step.reset();
                }
                workflow.completed_at = None;
                workflow.current_step = 0;
            }

            workflow.status = WorkflowStatus::Running;
            workflow.started_at = Some(Local::now());
            workflow.add_log("info", "Workflow started");
        }

        // Holding the lock across spawn keeps the task from deregistering before it is registered
        let mut running = self.lock_running();
        let manager = Arc::clone(self);
        let workflow_id = id.to_string();
        let handle = tokio::spawn(async move {
            manager.execute(&workflow_id).await;
            manager.lock_running().remove(&workflow_id);
        });
        running.insert(id.to_string(), handle);

        tracing::info!("Workflow started: {}", id);
        Ok(())
    }

    /// Stops a workflow. Works on workflows in any state.
    pub async fn cancel(&self, id: &str) -> Result<()> {
        let mut workflows = self.workflows.write().await;
        let workflow = workflows
            .get_mut(id)
            .ok_or_else(|| MissionControlError::WorkflowNotFound { id: id.to_string() })?;

        if let Some(handle) = self.lock_running().remove(id) {
            handle.abort();
        }

        for step in workflow
            .steps
            .iter_mut()
            .filter(|s| s.status == StepStatus::Running)
        {
            step.status = StepStatus::Failed;
            step.error = Some("Cancelled".to_string());
            step.completed_at = Some(Local::now());
        }

        workflow.status = WorkflowStatus::Cancelled;
        workflow.completed_at = Some(Local::now());
        workflow.add_log("warning", "Workflow cancelled by user");
        tracing::info!("Workflow cancelled: {}", id);

        Ok(())
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.lock_running().contains_key(id)
    }

    pub fn templates(&self) -> Vec<TemplateSummary> {
        self.templates.summaries()
    }

    pub async fn stats(&self) -> WorkflowStats {
        let workflows = self.workflows.read().await;
        let mut stats = WorkflowStats {
            total: workflows.len(),
            ..WorkflowStats::default()
        };
        for workflow in workflows.values() {
            match workflow.status {
                WorkflowStatus::Pending => stats.pending += 1,
                WorkflowStatus::Running => stats.running += 1,
                WorkflowStatus::Completed => stats.completed += 1,
                WorkflowStatus::Failed => stats.failed += 1,
                WorkflowStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    /// Aborts every running execution task.
    pub fn shutdown(&self) {
        let mut running = self.lock_running();
        for (id, handle) in running.drain() {
            tracing::debug!("Aborting workflow {}", id);
            handle.abort();
        }
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn execute(&self, id: &str) {
        let step_count = match self.workflows.read().await.get(id) {
            Some(workflow) => workflow.steps.len(),
            None => return,
        };

        let mut failed = false;

        for index in 0..step_count {
            let assignment = {
                let mut workflows = self.workflows.write().await;
                let Some(workflow) = workflows.get_mut(id) else {
                    return;
                };
                workflow.current_step = index;

                let step = workflow.steps[index].clone();
                if !workflow.dependencies_met(&step) {
                    workflow.steps[index].status = StepStatus::Skipped;
                    workflow.add_log(
                        "warning",
                        format!("Step '{}' skipped: dependencies not completed", step.name),
                    );
                    continue;
                }

                let current = &mut workflow.steps[index];
                current.status = StepStatus::Running;
                current.started_at = Some(Local::now());
                let assignment = StepAssignment {
                    workflow_name: workflow.name.clone(),
                    step_name: step.name.clone(),
                    agent_type: step.agent_type.clone(),
                    task_template: step.task_template.clone(),
                    timeout: Duration::from_secs(step.timeout_minutes * 60),
                };
                workflow.add_log("info", format!("Step '{}' started", step.name));
                assignment
            };

            let outcome = self.runner.run_step(&assignment).await;

            let mut workflows = self.workflows.write().await;
            let Some(workflow) = workflows.get_mut(id) else {
                return;
            };
            let step = &mut workflow.steps[index];
            step.completed_at = Some(Local::now());

            match outcome {
                Ok(outcome) => {
                    step.status = StepStatus::Completed;
                    step.result = Some(outcome.result);
                    step.subagent_id = outcome.subagent_id;
                    workflow.add_log(
                        "success",
                        format!("Step '{}' completed", assignment.step_name),
                    );
                }
                Err(e) => {
                    step.status = StepStatus::Failed;
                    step.error = Some(e.to_string());
                    workflow.status = WorkflowStatus::Failed;
                    workflow.add_log(
                        "error",
                        format!("Step '{}' failed: {}", assignment.step_name, e),
                    );
                    tracing::error!("Workflow {} failed at step '{}': {}", id, assignment.step_name, e);
                    failed = true;
                    break;
                }
            }
        }

        let mut workflows = self.workflows.write().await;
        if let Some(workflow) = workflows.get_mut(id) {
            if !failed {
                workflow.status = WorkflowStatus::Completed;
                workflow.add_log("success", "Workflow completed successfully");
                tracing::info!("Workflow completed: {}", id);
            }
            workflow.completed_at = Some(Local::now());
        }
    }
}
