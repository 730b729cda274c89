//! Error types for the Joinwatch monitor.
//!
//! Each module keeps its own narrow error enum ([`ConfigError`],
//! [`NotifyError`](crate::notifier::NotifyError),
//! [`ClassifierError`](crate::classifier::ClassifierError)); this module
//! defines the crate-wide [`MonitorError`] they roll up into.

use std::path::PathBuf;

use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::config::ConfigError;

/// Errors that can occur during monitor operations.
///
/// Only startup conditions and a failure to open a rotated-to log file are
/// represented here; [`MonitorError::exit_code`] maps them to a process
/// status. Notification failures never reach this type: they are
/// reported back to the follow loop as values and logged.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A built-in or configured pattern failed to compile.
    #[error("pattern error: {0}")]
    Classifier(#[from] ClassifierError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No candidate directory contains a log file.
    #[error("VRChat log not found")]
    LogNotFound,

    /// A log file was located but could not be opened for reading.
    #[error("failed to open log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The follow loop has already been stopped.
    #[error("follow loop stopped")]
    Stopped,
}

impl MonitorError {
    /// Process exit status for this error.
    ///
    /// Startup preconditions (bad configuration, no log to follow) exit with
    /// `2`; anything that goes wrong once following has started exits with `1`.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::LogNotFound => 2,
            _ => 1,
        }
    }
}

/// A specialized `Result` type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
