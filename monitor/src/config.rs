//! Configuration module for the Joinwatch monitor.
//!
//! Configuration is read once at startup into an immutable [`Config`] value
//! that is then passed by reference into the follow loop.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `JOINWATCH_SELF_NAME` | No | - | Fallback self identity when `--self-name` is not given |
//! | `JOINWATCH_TITLE` | No | `VRChat` | Notification title |
//! | `JOINWATCH_ICON` | No | - | Icon passed to `notify-send -i` |
//! | `JOINWATCH_SOUND` | No | - | Sound file played with `paplay` on each join |
//! | `JOINWATCH_LOG_DIR` | No | - | Extra directory searched for log files |
//! | `JOINWATCH_POLL_MS` | No | 500 | Idle sleep between read attempts |
//! | `JOINWATCH_ROTATION_CHECK_SECS` | No | 5 | Minimum seconds between rotation checks |
//!
//! # Example
//!
//! ```no_run
//! use joinwatch_monitor::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Watching {} candidate directories", config.candidates.len());
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use thiserror::Error;

use crate::locator::LogCandidate;

/// Default notification title.
const DEFAULT_TITLE: &str = "VRChat";

/// Default idle sleep between read attempts, in milliseconds.
const DEFAULT_POLL_MS: u64 = 500;

/// Default minimum interval between rotation checks, in seconds.
const DEFAULT_ROTATION_CHECK_SECS: u64 = 5;

/// File name patterns the VRChat client uses for its log.
pub const LOG_GLOBS: &[&str] = &["output_log_*.txt", "Player.log", "output_log.txt"];

/// VRChat's per-user data directory inside a Proton prefix.
const PROTON_VRCHAT_DIR: &str =
    "steamapps/compatdata/438100/pfx/drive_c/users/steamuser/AppData/LocalLow/VRChat/VRChat";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the Joinwatch monitor.
#[derive(Debug, Clone)]
pub struct Config {
    /// Title shown on every notification.
    pub title: String,

    /// Optional icon path for notifications.
    pub icon: Option<PathBuf>,

    /// Optional sound file played alongside each notification.
    pub sound: Option<PathBuf>,

    /// Self identity fallback from `JOINWATCH_SELF_NAME`, already trimmed.
    pub self_name: Option<String>,

    /// Places a VRChat log may live, in search order.
    pub candidates: Vec<LogCandidate>,

    /// How long to sleep when no new line is available.
    pub poll_interval: Duration,

    /// Minimum time between two rotation checks.
    pub rotation_check_interval: Duration,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - The home directory cannot be determined (needed for candidate paths)
    /// - `JOINWATCH_POLL_MS` or `JOINWATCH_ROTATION_CHECK_SECS` is not a positive integer
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        let home_dir = base_dirs.home_dir();

        let title = env::var("JOINWATCH_TITLE")
            .ok()
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let icon = env::var("JOINWATCH_ICON")
            .ok()
            .and_then(non_empty)
            .map(PathBuf::from);

        let sound = env::var("JOINWATCH_SOUND")
            .ok()
            .and_then(non_empty)
            .map(PathBuf::from);

        let self_name = env::var("JOINWATCH_SELF_NAME").ok().and_then(non_empty);

        // The extra directory is searched before the built-ins but mtime still
        // decides which file wins.
        let mut candidates = Vec::new();
        if let Some(dir) = env::var("JOINWATCH_LOG_DIR").ok().and_then(non_empty) {
            candidates.push(LogCandidate::new(dir, LOG_GLOBS));
        }
        candidates.extend(builtin_candidates(home_dir));

        let poll_interval =
            Duration::from_millis(positive_u64("JOINWATCH_POLL_MS", DEFAULT_POLL_MS)?);
        let rotation_check_interval = Duration::from_secs(positive_u64(
            "JOINWATCH_ROTATION_CHECK_SECS",
            DEFAULT_ROTATION_CHECK_SECS,
        )?);

        Ok(Self {
            title,
            icon,
            sound,
            self_name,
            candidates,
            poll_interval,
            rotation_check_interval,
        })
    }
}

/// Known VRChat install locations below `home`.
///
/// Covers Steam under Proton (native and `~/.steam` symlink layouts), Flatpak
/// Steam, and the native Unity player directory.
pub fn builtin_candidates(home: &Path) -> Vec<LogCandidate> {
    [
        home.join(".local/share/Steam").join(PROTON_VRCHAT_DIR),
        home.join(".steam/steam").join(PROTON_VRCHAT_DIR),
        home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam")
            .join(PROTON_VRCHAT_DIR),
        home.join(".config/unity3d/VRChat/VRChat"),
    ]
    .into_iter()
    .map(|dir| LogCandidate::new(dir, LOG_GLOBS))
    .collect()
}

/// Trims a value and drops it when nothing is left.
fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads an optional positive integer, falling back to `default` when unset.
fn positive_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(val) => {
            let parsed = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected positive integer, got '{val}'"),
                })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "value must be greater than 0".to_string(),
                });
            }
            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}
