use crate::domain::model::clock;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of workflow log entries included in a serialized view.
pub const VIEW_LOG_LIMIT: usize = 20;

pub const DEFAULT_STEP_TIMEOUT_MINUTES: u64 = 30;

// Wire values are shared with the dashboard and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "em_andamento")]
    Running,
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "falhou")]
    Failed,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pendente",
            Self::Running => "em_andamento",
            Self::Completed => "concluido",
            Self::Failed => "falhou",
            Self::Cancelled => "cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(Self::Pending),
            "em_andamento" => Ok(Self::Running),
            "concluido" => Ok(Self::Completed),
            "falhou" => Ok(Self::Failed),
            "cancelado" => Ok(Self::Cancelled),
            other => Err(format!("unknown workflow status: {}", other)),
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "em_andamento")]
    Running,
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "falhou")]
    Failed,
    #[serde(rename = "pulado")]
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLog {
    pub time: String,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub description: String,
    pub agent_type: String,
    pub task_template: String,
    pub depends_on: Vec<String>,
    pub timeout_minutes: u64,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Local>>,
    pub completed_at: Option<DateTime<Local>>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub subagent_id: Option<String>,
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: short_id(8),
            name: name.into(),
            description: String::new(),
            agent_type: "assistente".to_string(),
            task_template: String::new(),
            depends_on: Vec::new(),
            timeout_minutes: DEFAULT_STEP_TIMEOUT_MINUTES,
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            subagent_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = agent_type.into();
        self
    }

    pub fn with_task_template(mut self, task_template: impl Into<String>) -> Self {
        self.task_template = task_template.into();
        self
    }

    pub fn with_dependencies(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Clears execution state so the step can run again.
    pub fn reset(&mut self) {
        self.status = StepStatus::Pending;
        self.started_at = None;
        self.completed_at = None;
        self.result = None;
        self.error = None;
        self.subagent_id = None;
    }

    pub fn view(&self) -> StepView {
        StepView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            agent_type: self.agent_type.clone(),
            status: self.status,
            depends_on: self.depends_on.clone(),
            started_at: self.started_at.map(|t| t.to_rfc3339()),
            completed_at: self.completed_at.map(|t| t.to_rfc3339()),
            result: self.result.clone(),
            error: self.error.clone(),
            subagent_id: self.subagent_id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub team: String,
    pub created_by: String,
    pub status: WorkflowStatus,
    pub steps: Vec<WorkflowStep>,
    pub created_at: DateTime<Local>,
    pub started_at: Option<DateTime<Local>>,
    pub completed_at: Option<DateTime<Local>>,
    pub current_step: usize,
    pub logs: Vec<WorkflowLog>,
}

impl Workflow {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        team: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let created_at = Local::now();
        Self {
            id: format!("wf-{}-{}", created_at.format("%Y%m%d-%H%M%S"), short_id(4)),
            name: name.into(),
            description: description.into(),
            team: team.into(),
            created_by: created_by.into(),
            status: WorkflowStatus::Pending,
            steps: Vec::new(),
            created_at,
            started_at: None,
            completed_at: None,
            current_step: 0,
            logs: Vec::new(),
        }
    }

    pub fn add_step(&mut self, step: WorkflowStep) {
        self.steps.push(step);
    }

    pub fn add_log(&mut self, level: &str, message: impl Into<String>) {
        self.logs.push(WorkflowLog {
            time: clock(),
            level: level.to_string(),
            message: message.into(),
        });
    }

    /// Percentage of completed steps, rounded down.
    pub fn progress(&self) -> u8 {
        if self.steps.is_empty() {
            return 0;
        }
        let completed = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        (completed * 100 / self.steps.len()) as u8
    }

    pub fn duration(&self) -> String {
        self.duration_at(Local::now())
    }

    fn duration_at(&self, now: DateTime<Local>) -> String {
        let Some(started) = self.started_at else {
            return "0m 0s".to_string();
        };
        let end = self.completed_at.unwrap_or(now);
        let secs = (end - started).num_seconds().max(0);
        format!("{}m {}s", secs / 60, secs % 60)
    }

    /// True when every step this one depends on has completed.
    pub fn dependencies_met(&self, step: &WorkflowStep) -> bool {
        step.depends_on.iter().all(|dep| {
            self.steps
                .iter()
                .find(|s| &s.id == dep)
                .map(|s| s.status == StepStatus::Completed)
                .unwrap_or(true)
        })
    }

    pub fn view(&self) -> WorkflowView {
        let skip = self.logs.len().saturating_sub(VIEW_LOG_LIMIT);
        WorkflowView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            team: self.team.clone(),
            status: self.status,
            progress: self.progress(),
            duration: self.duration(),
            created_at: self.created_at.to_rfc3339(),
            started_at: self.started_at.map(|t| t.to_rfc3339()),
            completed_at: self.completed_at.map(|t| t.to_rfc3339()),
            steps: self.steps.iter().map(WorkflowStep::view).collect(),
            current_step: self.current_step,
            logs: self.logs[skip..].to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub agent_type: String,
    pub status: StepStatus,
    pub depends_on: Vec<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub subagent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub team: String,
    pub status: WorkflowStatus,
    pub progress: u8,
    pub duration: String,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub steps: Vec<StepView>,
    pub current_step: usize,
    pub logs: Vec<WorkflowLog>,
}

fn short_id(len: usize) -> String {
    uuid::Uuid::new_v4().simple().to_string()[..len].to_string()
}
