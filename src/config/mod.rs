pub mod settings;
pub mod toml_config;

pub use settings::{GatewayMode, Settings};
pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Command-line flags. Anything left unset falls back to the config file, then to defaults.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "mission-control")]
#[command(version)]
#[command(about = "Mission Control API: dashboard backend for the OpenClaw agent gateway")]
pub struct CliConfig {
    /// TOML configuration file
    #[arg(long, short = 'c', env = "MISSION_CONTROL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address [default: 0.0.0.0]
    #[arg(long, env = "MISSION_CONTROL_HOST")]
    pub host: Option<String>,

    /// Listen port [default: 8000]
    #[arg(long, short = 'p', env = "MISSION_CONTROL_PORT")]
    pub port: Option<u16>,

    /// OpenClaw gateway WebSocket URL [default: ws://127.0.0.1:18789]
    #[arg(long, env = "OPENCLAW_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// websocket, cli or offline [default: websocket]
    #[arg(long, env = "OPENCLAW_GATEWAY_MODE")]
    pub gateway_mode: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the config file if one was given, applies the flags on top and validates.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_toml(&TomlConfig::from_file(path)?)?,
            None => Settings::default(),
        };

        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(url) = &self.gateway_url {
            settings.ws.url = url.clone();
        }
        if let Some(mode) = &self.gateway_mode {
            settings.gateway_mode = mode.parse()?;
        }
        settings.verbose |= self.verbose;
        settings.json_logs |= self.json_logs;
        settings.monitor |= self.monitor;

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("mission-control").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_no_arguments_uses_defaults() {
        let cli = CliConfig {
            config: None,
            host: None,
            port: None,
            gateway_url: None,
            gateway_mode: None,
            verbose: false,
            json_logs: false,
            monitor: false,
        };
        let settings = cli.resolve().unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.gateway_mode, GatewayMode::WebSocket);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[server]\nport = 9000\nhost = \"127.0.0.1\"\n\n[gateway]\nmode = \"cli\"\n")
            .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = parse(&["--config", &path, "--port", "9001", "--gateway-mode", "offline", "--verbose"]);
        let settings = cli.resolve().unwrap();

        assert_eq!(settings.port, 9001);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.gateway_mode, GatewayMode::Offline);
        assert!(settings.verbose);
    }

    #[test]
    fn test_invalid_flag_values() {
        let bad_url = parse(&["--gateway-url", "ftp://example.com"]);
        assert!(bad_url.resolve().is_err());

        let bad_mode = parse(&["--gateway-mode", "telepathy"]);
        assert!(bad_mode.resolve().is_err());

        assert!(CliConfig::try_parse_from(["mission-control", "--port", "not-a-port"]).is_err());
    }
}
