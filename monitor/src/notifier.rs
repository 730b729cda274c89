//! Desktop notification boundary.
//!
//! The follow loop talks to a [`Notifier`]; the production implementation,
//! [`DesktopNotifier`], shells out to `notify-send` and optionally `paplay`.
//! Both calls report failure as a [`NotifyError`] value. Callers log it and
//! carry on; a broken notification setup must never stop the monitor.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::trace;

use crate::config::Config;

/// Program used to raise desktop notifications.
pub const NOTIFY_PROGRAM: &str = "notify-send";

/// Program used to play the audio cue.
pub const SOUND_PROGRAM: &str = "paplay";

/// Urgency passed to `notify-send`.
const URGENCY: &str = "normal";

/// Errors from the external notification programs.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The program could not be started (missing binary, permissions).
    #[error("{program} failed: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but reported failure.
    #[error("{program} exited with {status}")]
    Status { program: String, status: ExitStatus },
}

/// Something that can show a join notification.
pub trait Notifier {
    /// Shows a notification with the given title and body.
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;

    /// Plays the audio cue, if one is configured.
    fn play_cue(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier backed by `notify-send` and `paplay`.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    icon: Option<PathBuf>,
    sound: Option<PathBuf>,
    notify_program: String,
    sound_program: String,
}

impl DesktopNotifier {
    pub fn new(icon: Option<PathBuf>, sound: Option<PathBuf>) -> Self {
        Self {
            icon,
            sound,
            notify_program: NOTIFY_PROGRAM.to_string(),
            sound_program: SOUND_PROGRAM.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.icon.clone(), config.sound.clone())
    }

    /// Replaces the programs invoked for notifications and sounds.
    #[must_use]
    pub fn with_programs(
        mut self,
        notify_program: impl Into<String>,
        sound_program: impl Into<String>,
    ) -> Self {
        self.notify_program = notify_program.into();
        self.sound_program = sound_program.into();
        self
    }

    /// Arguments passed to the notification program.
    pub fn notify_args(&self, title: &str, body: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![title.into(), body.into(), "-u".into(), URGENCY.into()];
        if let Some(icon) = &self.icon {
            args.push("-i".into());
            args.push(icon.into());
        }
        args
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        run(&self.notify_program, self.notify_args(title, body))
    }

    fn play_cue(&self) -> Result<(), NotifyError> {
        match &self.sound {
            Some(sound) => run(&self.sound_program, vec![sound.into()]),
            None => Ok(()),
        }
    }
}

/// Runs `program` to completion with its output discarded.
fn run(program: &str, args: Vec<OsString>) -> Result<(), NotifyError> {
    trace!(program = %program, ?args, "Running notification program");

    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| NotifyError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(NotifyError::Status {
            program: program.to_string(),
            status,
        })
    }
}
