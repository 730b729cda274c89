//! Joinwatch Monitor - desktop notifications for VRChat player joins.
//!
//! The monitor follows the VRChat client log as it grows, recognises lines
//! announcing that a player joined the current instance, and raises a desktop
//! notification for each one, except for the local user's own joins.
//!
//! # Overview
//!
//! VRChat writes a fresh `output_log_*.txt` every session, and depending on
//! the install (Proton, Flatpak Steam, native) it lands in one of several
//! directories. The monitor picks the newest log across all of them, tails
//! it from the end, and re-checks every few seconds whether a newer file has
//! appeared.
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for monitor operations
//! - [`locator`]: Finds the newest log file among candidate directories
//! - [`identity`]: Resolves the local user's display name
//! - [`classifier`]: Join detection and display name extraction
//! - [`follow`]: The tailing state machine and run loop
//! - [`notifier`]: `notify-send` / `paplay` boundary
//! - [`console`]: Tagged status lines for the terminal

pub mod classifier;
pub mod config;
pub mod console;
pub mod error;
pub mod follow;
pub mod identity;
pub mod locator;
pub mod notifier;

pub use classifier::{Classifier, ClassifierError, JoinEvent};
pub use config::{Config, ConfigError};
pub use error::{MonitorError, Result};
pub use follow::{FollowEvent, FollowPhase, Follower, Step};
pub use identity::{IdentitySource, SelfIdentity};
pub use locator::{locate, LogCandidate, ResolvedLogFile};
pub use notifier::{DesktopNotifier, Notifier, NotifyError};
