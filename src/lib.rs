pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CliGateway, OpenClawClient};
pub use app::Application;
pub use config::{GatewayMode, Settings};
pub use crate::core::workflow_manager::WorkflowManager;
pub use utils::error::{MissionControlError, Result};
