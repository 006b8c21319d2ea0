pub mod executor;
pub mod system_log;
pub mod templates;
pub mod workflow;
pub mod workflow_manager;

pub use crate::domain::model::{LogEntry, Session, Subagent, SystemStats};
pub use crate::domain::ports::{AgentGateway, StepRunner};
pub use crate::utils::error::Result;
