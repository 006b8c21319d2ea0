// Adapters layer: concrete gateway transports behind the `AgentGateway` port.

pub mod openclaw_cli;
pub mod openclaw_ws;
pub mod protocol;
pub mod simulated;

pub use openclaw_cli::{CliGateway, CliGatewayConfig};
pub use openclaw_ws::{OpenClawClient, WsGatewayConfig, DEFAULT_GATEWAY_URL};
