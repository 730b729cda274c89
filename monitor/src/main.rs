//! Joinwatch - desktop notifications when someone joins your VRChat instance.
//!
//! This binary follows the newest VRChat log file and calls `notify-send`
//! for every player join, skipping your own.
//!
//! # Exit Codes
//!
//! - `0`: stopped by Ctrl+C or SIGTERM
//! - `1`: the log could not be read after startup
//! - `2`: usage error, invalid configuration, or no VRChat log found
//!
//! # Environment Variables
//!
//! See the [`config`] module for available configuration options.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use joinwatch_monitor::classifier::Classifier;
use joinwatch_monitor::config::Config;
use joinwatch_monitor::console;
use joinwatch_monitor::error::MonitorError;
use joinwatch_monitor::follow::Follower;
use joinwatch_monitor::identity;
use joinwatch_monitor::locator;
use joinwatch_monitor::notifier::DesktopNotifier;

/// Exit status for failures that are not a [`MonitorError`].
const EXIT_FAILURE: u8 = 1;

/// Joinwatch - VRChat join notifier.
///
/// Follows the VRChat log and shows a desktop notification whenever another
/// player joins your instance.
#[derive(Parser, Debug)]
#[command(name = "joinwatch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    JOINWATCH_SELF_NAME            Your display name (used when --self-name is absent)
    JOINWATCH_TITLE                Notification title (default: VRChat)
    JOINWATCH_ICON                 Notification icon path
    JOINWATCH_SOUND                Sound file played with paplay on each join
    JOINWATCH_LOG_DIR              Extra directory to search for VRChat logs
    JOINWATCH_POLL_MS              Idle poll interval in ms (default: 500)
    JOINWATCH_ROTATION_CHECK_SECS  Seconds between new-log checks (default: 5)
    RUST_LOG                       Diagnostic log filter (default: warn)

EXAMPLES:
    # Notify on every join except your own
    joinwatch --self-name \"My Name\"
")]
struct Cli {
    /// Your VRChat display name; joins under this name are not notified.
    #[arg(long = "self-name", visible_alias = "me", value_name = "NAME")]
    self_name: Option<String>,
}

fn main() -> ExitCode {
    // Usage errors exit with status 2 inside clap.
    let cli = Cli::parse();

    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            let code = e
                .downcast_ref::<MonitorError>()
                .map_or(EXIT_FAILURE, MonitorError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Resolves startup state and runs the follow loop until shutdown.
///
/// Every failure carries a [`MonitorError`] so `main` can pick the exit status.
fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().map_err(MonitorError::from)?;

    let log = locator::locate(&config.candidates).ok_or(MonitorError::LogNotFound)?;

    info!(path = %log.path.display(), "Located VRChat log");

    let identity = identity::resolve(
        &log.path,
        cli.self_name.as_deref(),
        config.self_name.as_deref(),
    );
    console::info(console::identity_line(&identity));

    let classifier = Classifier::builtin()
        .map_err(MonitorError::from)
        .context("Failed to compile join patterns")?;
    let notifier = DesktopNotifier::from_config(&config);
    let mut follower = Follower::new(config, classifier, identity, notifier, log.path);

    // The follow loop is single-threaded by design.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(MonitorError::from)
        .context("Failed to create tokio runtime")?;

    runtime
        .block_on(follower.run(wait_for_shutdown(), console::report))
        .context("Follow loop stopped")?;

    console::info("Exiting.");
    Ok(())
}

/// Initializes the logging subsystem.
///
/// Defaults to `warn` so the tagged console lines stay readable; set
/// `RUST_LOG=joinwatch_monitor=debug` for diagnostics.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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
}
