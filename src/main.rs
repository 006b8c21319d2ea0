use clap::Parser;
use mission_control::utils::error::ErrorSeverity;
use mission_control::utils::{logger, monitor::SystemMonitor};
use mission_control::{Application, CliConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            // Logging is not up yet
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_logger(settings.verbose, settings.json_logs);

    tracing::info!("Starting Mission Control API v{}", env!("CARGO_PKG_VERSION"));
    if settings.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    let monitor = SystemMonitor::new(settings.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
        monitor.log_stats("startup");
    }

    let app = Application::build(&settings);
    app.connect_gateway().await;

    let addr = settings.socket_addr()?;
    let (_bound, server) = match app.serve(addr, shutdown_signal()).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(
                "❌ Failed to start server: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            let exit_code = match e.severity() {
                ErrorSeverity::Critical => 3,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    };

    server.await?;

    app.shutdown().await;
    monitor.log_final_stats();
    Ok(())
}

/// Ctrl-C, or SIGTERM from the container runtime.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
