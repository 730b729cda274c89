//! The follow loop: tails the live log, survives rotation and turns join
//! lines into notifications.
//!
//! # Architecture
//!
//! [`Follower`] is an explicit state machine advanced one [`Step`] at a time:
//!
//! ```text
//! Opening(path) ──open at EOF──▶ Tailing(cursor) ──newer log found──▶ Switching(from, to)
//!                                   ▲    │                                  │
//!                                   │    └──file shrank: rewind to 0        │
//!                                   └──────────────open at EOF──────────────┘
//! any state ──stop()/open failure──▶ Stopped
//! ```
//!
//! The cursor starts at end-of-file, so nothing written before the monitor
//! (or before a rotation was noticed) is reported. When no complete line is
//! available the follower checks, at most once per rotation interval, whether
//! the locator now points at a different file. [`Follower::run`] drives the
//! steps and sleeps for the poll interval whenever a step comes back idle.
//!
//! Everything runs on one task; the cursor is owned by the follower alone.

use std::fs::File;
use std::future::Future;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::mem;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::identity::SelfIdentity;
use crate::locator;
use crate::notifier::Notifier;

/// Notification body used when a join carries no recoverable name.
pub const NAMELESS_BODY: &str = "A player joined your instance";

/// Longest line, in bytes, the follower will buffer. Longer lines are dropped.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Notification body for a named join.
pub fn join_body(name: &str) -> String {
    format!("Player joined: {name}")
}

/// Something worth reporting that happened while following the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowEvent {
    /// The initial log file was opened.
    Following(PathBuf),

    /// A newer log file was found and is now being followed.
    Switched { from: PathBuf, to: PathBuf },

    /// The followed file shrank; reading restarted from its beginning.
    Truncated(PathBuf),

    /// A player joined and a notification was attempted.
    Joined {
        /// Extracted display name, `None` for nameless joins.
        name: Option<String>,
        /// Failures from the notifier or audio cue, already logged.
        warnings: Vec<String>,
    },

    /// A join by the local user was suppressed.
    Skipped { name: String },
}

/// Outcome of a single [`Follower::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A complete line was consumed; carries the outcome if it was a join.
    Line(Option<FollowEvent>),
    /// The state machine moved on; step again without sleeping.
    Transition(Option<FollowEvent>),
    /// No new data; sleep before stepping again.
    Idle,
}

/// Coarse view of the follower's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowPhase {
    Opening,
    Tailing,
    Switching,
    Stopped,
}

enum FollowState {
    Opening(PathBuf),
    Tailing(FollowCursor),
    Switching { from: PathBuf, to: PathBuf },
    Stopped,
}

/// Read handle on one log file, tracking how far it has been consumed.
struct FollowCursor {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    /// Bytes of a line whose newline has not been written yet.
    pending: Vec<u8>,
    /// Set while skipping the rest of a line longer than [`MAX_LINE_BYTES`].
    discarding: bool,
}

impl FollowCursor {
    /// Opens `path` positioned at its current end.
    fn open_at_end(path: &Path) -> Result<Self> {
        let open_err = |source| MonitorError::Open {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(open_err)?;
        let offset = file.seek(SeekFrom::End(0)).map_err(open_err)?;

        debug!(path = %path.display(), offset, "Opened log at end of file");

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            offset,
            pending: Vec::new(),
            discarding: false,
        })
    }

    /// Returns the next complete, non-empty line, or `None` at end of data.
    ///
    /// A trailing fragment without a newline is kept until the rest of the
    /// line arrives, up to [`MAX_LINE_BYTES`]; past that the whole line is
    /// dropped. Invalid UTF-8 is replaced rather than rejected.
    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            // pending never exceeds MAX_LINE_BYTES between reads.
            let room = (MAX_LINE_BYTES + 1 - self.pending.len()) as u64;
            let read = (&mut self.reader)
                .take(room)
                .read_until(b'\n', &mut self.pending)?;
            if read == 0 {
                return Ok(None);
            }
            self.offset += read as u64;

            if !self.pending.ends_with(b"\n") {
                if self.pending.len() > MAX_LINE_BYTES {
                    if !self.discarding {
                        warn!(
                            path = %self.path.display(),
                            limit = MAX_LINE_BYTES,
                            "Dropping oversized log line"
                        );
                    }
                    self.pending.clear();
                    self.discarding = true;
                    continue;
                }
                trace!(path = %self.path.display(), bytes = self.pending.len(), "Partial line buffered");
                return Ok(None);
            }

            let raw = mem::take(&mut self.pending);
            if mem::take(&mut self.discarding) {
                continue;
            }
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }

    /// Returns `true` if the file is now shorter than what was consumed.
    fn is_truncated(&self) -> bool {
        self.reader
            .get_ref()
            .metadata()
            .is_ok_and(|meta| meta.len() < self.offset)
    }

    fn rewind(&mut self) -> std::io::Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.offset = 0;
        self.pending.clear();
        self.discarding = false;
        Ok(())
    }
}

/// Follows the live VRChat log and notifies about joins.
pub struct Follower<N> {
    config: Config,
    classifier: Classifier,
    identity: SelfIdentity,
    notifier: N,
    state: FollowState,
    last_rotation_check: Instant,
}

impl<N: Notifier> Follower<N> {
    /// Creates a follower that will open `log_file` on its first step.
    pub fn new(
        config: Config,
        classifier: Classifier,
        identity: SelfIdentity,
        notifier: N,
        log_file: PathBuf,
    ) -> Self {
        Self {
            config,
            classifier,
            identity,
            notifier,
            state: FollowState::Opening(log_file),
            last_rotation_check: Instant::now(),
        }
    }

    pub fn phase(&self) -> FollowPhase {
        match self.state {
            FollowState::Opening(_) => FollowPhase::Opening,
            FollowState::Tailing(_) => FollowPhase::Tailing,
            FollowState::Switching { .. } => FollowPhase::Switching,
            FollowState::Stopped => FollowPhase::Stopped,
        }
    }

    /// Path of the file currently being read, if one is open.
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            FollowState::Tailing(cursor) => Some(&cursor.path),
            _ => None,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Stops following and releases the open file handle.
    pub fn stop(&mut self) {
        if !matches!(self.state, FollowState::Stopped) {
            debug!("Follow loop stopped");
        }
        self.state = FollowState::Stopped;
    }

    /// Advances the state machine by one step.
    ///
    /// `now` is used to rate-limit rotation checks.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Open`] if a log file cannot be opened, after
    /// which the follower is stopped, and [`MonitorError::Stopped`] if it
    /// already was.
    pub fn step(&mut self, now: Instant) -> Result<Step> {
        match mem::replace(&mut self.state, FollowState::Stopped) {
            FollowState::Stopped => Err(MonitorError::Stopped),

            FollowState::Opening(path) => {
                let cursor = FollowCursor::open_at_end(&path)?;
                info!(path = %path.display(), "Following log");
                self.state = FollowState::Tailing(cursor);
                self.last_rotation_check = now;
                Ok(Step::Transition(Some(FollowEvent::Following(path))))
            }

            FollowState::Switching { from, to } => {
                let cursor = FollowCursor::open_at_end(&to)?;
                info!(from = %from.display(), to = %to.display(), "Switched to newer log");
                self.state = FollowState::Tailing(cursor);
                Ok(Step::Transition(Some(FollowEvent::Switched { from, to })))
            }

            FollowState::Tailing(mut cursor) => match cursor.next_line() {
                Ok(Some(line)) => {
                    let event = self.handle_line(&line);
                    self.state = FollowState::Tailing(cursor);
                    Ok(Step::Line(event))
                }
                Ok(None) => Ok(self.idle(cursor, now)),
                Err(e) => {
                    warn!(path = %cursor.path.display(), error = %e, "Error reading log line");
                    Ok(self.idle(cursor, now))
                }
            },
        }
    }

    /// Handles end of data: truncation, then a rate-limited rotation check.
    fn idle(&mut self, mut cursor: FollowCursor, now: Instant) -> Step {
        if cursor.is_truncated() {
            info!(path = %cursor.path.display(), old_pos = cursor.offset, "Log truncated, reading from start");
            match cursor.rewind() {
                Ok(()) => {
                    let path = cursor.path.clone();
                    self.state = FollowState::Tailing(cursor);
                    return Step::Transition(Some(FollowEvent::Truncated(path)));
                }
                Err(e) => {
                    warn!(path = %cursor.path.display(), error = %e, "Failed to rewind truncated log");
                }
            }
        }

        if now.duration_since(self.last_rotation_check) >= self.config.rotation_check_interval {
            self.last_rotation_check = now;
            if let Some(latest) = locator::locate(&self.config.candidates) {
                if latest.path != cursor.path {
                    let from = cursor.path.clone();
                    drop(cursor);
                    self.state = FollowState::Switching {
                        from,
                        to: latest.path,
                    };
                    return Step::Transition(None);
                }
            }
        }

        self.state = FollowState::Tailing(cursor);
        Step::Idle
    }

    /// Classifies one line and notifies or suppresses accordingly.
    fn handle_line(&self, line: &str) -> Option<FollowEvent> {
        let event = self.classifier.classify(line)?;

        match event.name {
            Some(name) if self.identity.is_self(&name) => {
                debug!(name = %name, "Suppressed self join");
                Some(FollowEvent::Skipped { name })
            }
            Some(name) => {
                let warnings = self.deliver(&join_body(&name));
                Some(FollowEvent::Joined {
                    name: Some(name),
                    warnings,
                })
            }
            None => {
                let warnings = self.deliver(NAMELESS_BODY);
                Some(FollowEvent::Joined {
                    name: None,
                    warnings,
                })
            }
        }
    }

    /// Sends the notification and audio cue, collecting their failures.
    fn deliver(&self, body: &str) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Err(e) = self.notifier.notify(&self.config.title, body) {
            warn!(error = %e, "Notification failed");
            warnings.push(e.to_string());
        }
        if let Err(e) = self.notifier.play_cue() {
            warn!(error = %e, "Audio cue failed");
            warnings.push(e.to_string());
        }

        warnings
    }

    /// Runs until `shutdown` resolves or an open failure stops the follower.
    ///
    /// Every [`FollowEvent`] is passed to `report` as it happens. The file
    /// handle is released before returning, whatever the outcome.
    pub async fn run<F>(&mut self, shutdown: F, mut report: impl FnMut(&FollowEvent)) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let result = loop {
            match self.step(Instant::now()) {
                Ok(Step::Line(event) | Step::Transition(event)) => {
                    if let Some(event) = event {
                        report(&event);
                    }
                    if (&mut shutdown).now_or_never().is_some() {
                        break Ok(());
                    }
                }
                Ok(Step::Idle) => {
                    tokio::select! {
                        _ = &mut shutdown => break Ok(()),
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(e) => break Err(e),
            }
        };

        self.stop();
        result
    }
}
