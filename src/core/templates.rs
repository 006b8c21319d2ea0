use crate::core::workflow::WorkflowStep;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_agent_type() -> String {
    "assistente".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default)]
    pub task_template: String,
    /// Names of earlier steps in the same template.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<StepTemplate>,
}

impl WorkflowTemplate {
    /// Instantiates fresh steps, translating name dependencies into step ids.
    pub fn build_steps(&self) -> Vec<WorkflowStep> {
        let mut ids_by_name: HashMap<&str, String> = HashMap::new();
        let mut steps = Vec::with_capacity(self.steps.len());

        for template in &self.steps {
            let depends_on = template
                .depends_on
                .iter()
                .filter_map(|name| ids_by_name.get(name.as_str()).cloned())
                .collect();

            let step = WorkflowStep::new(&template.name)
                .with_description(&template.description)
                .with_agent_type(&template.agent_type)
                .with_task_template(&template.task_template)
                .with_dependencies(depends_on);

            ids_by_name.insert(template.name.as_str(), step.id.clone());
            steps.push(step);
        }

        steps
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps_count: usize,
}

/// Ordered set of templates keyed by id.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<WorkflowTemplate>,
}

impl TemplateCatalog {
    pub fn builtin() -> Self {
        Self {
            templates: vec![ci_cd(), code_analysis(), support_triage()],
        }
    }

    /// Adds templates, replacing any existing template with the same id.
    pub fn with_templates(mut self, extra: Vec<WorkflowTemplate>) -> Self {
        for template in extra {
            match self.templates.iter_mut().find(|t| t.id == template.id) {
                Some(existing) => *existing = template,
                None => self.templates.push(template),
            }
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn summaries(&self) -> Vec<TemplateSummary> {
        self.templates
            .iter()
            .map(|t| TemplateSummary {
                id: t.id.clone(),
                name: t.name.clone(),
                description: t.description.clone(),
                steps_count: t.steps.len(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn step(name: &str, description: &str, agent_type: &str, task_template: &str) -> StepTemplate {
    StepTemplate {
        name: name.to_string(),
        description: description.to_string(),
        agent_type: agent_type.to_string(),
        task_template: task_template.to_string(),
        depends_on: Vec::new(),
    }
}

fn ci_cd() -> WorkflowTemplate {
    WorkflowTemplate {
        id: "ci-cd".to_string(),
        name: "CI/CD Pipeline".to_string(),
        description: "Full integration and deployment pipeline".to_string(),
        steps: vec![
            step(
                "Code Review",
                "Automated code analysis",
                "revisor",
                "Review the code for bugs, code smells and violations of good practice. Suggest improvements.",
            ),
            step(
                "Unit Tests",
                "Run the automated test suite",
                "testador",
                "Run all unit tests and produce a coverage report.",
            ),
            step(
                "Integration Tests",
                "Integration tests across components",
                "testador",
                "Run the integration tests and check communication between services.",
            ),
            step(
                "Deploy",
                "Deploy the application to production",
                "deployer",
                "Deploy the application following the deployment checklist.",
            ),
        ],
    }
}

fn code_analysis() -> WorkflowTemplate {
    WorkflowTemplate {
        id: "analise-codigo".to_string(),
        name: "Code Analysis".to_string(),
        description: "Complete code quality analysis".to_string(),
        steps: vec![
            step(
                "Static Analysis",
                "Static analysis with linters",
                "revisor",
                "Run static analysis tools and identify problems.",
            ),
            step(
                "Security Analysis",
                "Vulnerability scan",
                "especialista",
                "Identify security vulnerabilities in the code.",
            ),
            step(
                "Report",
                "Consolidated report",
                "analista",
                "Compile a report with every finding and recommendation.",
            ),
        ],
    }
}

fn support_triage() -> WorkflowTemplate {
    WorkflowTemplate {
        id: "suporte".to_string(),
        name: "Support Triage".to_string(),
        description: "Automated ticket triage".to_string(),
        steps: vec![
            step(
                "Classification",
                "Classify ticket priority",
                "analista",
                "Analyse the ticket and classify it by severity and area.",
            ),
            step(
                "Investigation",
                "Preliminary investigation of the problem",
                "especialista",
                "Investigate logs and identify likely root causes.",
            ),
            step(
                "Escalation",
                "Route to the right team",
                "gerente",
                "Decide which team should resolve the ticket.",
            ),
        ],
    }
}
