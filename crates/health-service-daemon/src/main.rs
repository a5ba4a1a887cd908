//! Health service daemon binary

use health_service_daemon::{Config, Daemon, ExitReason};

#[tokio::main]
async fn main() -> common::Result<()> {
    // Load configuration first (needed for logging settings). A config file
    // that exists but does not parse or validate is fatal.
    let config = Config::load()?;

    let level = config.logging.level.as_deref().unwrap_or("info");
    let json = config.logging.format.as_deref() == Some("json");
    common::logging::init_with_level(level, json)?;

    tracing::info!(node = %config.health.node_name, "Health service daemon starting");

    let exit_on_failure = config.shutdown.exit_on_failure;
    let outcome = Daemon::new(config).run().await?;

    if !outcome.clean_shutdown {
        tracing::error!("Health service scheduler did not shut down cleanly");
        if exit_on_failure {
            tracing::error!("Exiting application");
            std::process::exit(1);
        }
    }

    if outcome.reason == ExitReason::RestartRequested {
        tracing::error!("Exiting for restart");
        std::process::exit(1);
    }

    tracing::info!("Health service daemon stopped");
    Ok(())
}
