//! Self-identity resolution.
//!
//! The monitor never notifies about the local user joining their own
//! instance. The local display name is resolved once at startup, trying in
//! order:
//!
//! 1. The `--self-name` command line value
//! 2. The `JOINWATCH_SELF_NAME` environment variable
//! 3. A scan of the last [`SCAN_WINDOW_BYTES`] of the current log for VRChat's
//!    own login lines
//!
//! If all three fail the identity is unknown and no join is ever suppressed.
//! Resolution never fails: read errors during the scan count as "not found".

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::classifier::{compile_patterns, first_capture};

/// How much of the end of the log file is scanned for the local user's name.
pub const SCAN_WINDOW_BYTES: u64 = 200_000;

/// Lines VRChat writes about the local user, highest priority first.
pub const SELF_PATTERNS: &[&str] = &[
    r"User Authenticated:\s*(.+?)\s*\(usr_[0-9a-f-]+\)",
    r#"Initialized PlayerAPI\s+"(.+?)"\s+is local"#,
    r"User Authenticated:\s*(.+)$",
];

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Supplied on the command line.
    Override,
    /// Read from `JOINWATCH_SELF_NAME`.
    Environment,
    /// Found in the tail of the log file.
    LogScan,
    /// Nothing worked; suppression is disabled.
    Unknown,
}

impl std::fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Override => "command line",
            Self::Environment => "environment",
            Self::LogScan => "log scan",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// The local user's display name, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfIdentity {
    name: Option<String>,
    source: IdentitySource,
}

impl SelfIdentity {
    /// An identity that never matches anything.
    pub fn unknown() -> Self {
        Self {
            name: None,
            source: IdentitySource::Unknown,
        }
    }

    fn found(name: String, source: IdentitySource) -> Self {
        Self {
            name: Some(name),
            source,
        }
    }

    /// The resolved name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> IdentitySource {
        self.source
    }

    /// Returns `true` if `candidate` is the local user (case-insensitive).
    ///
    /// Always `false` when the identity is unknown.
    pub fn is_self(&self, candidate: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.to_lowercase() == candidate.to_lowercase())
    }
}

/// Resolves the local user's identity.
///
/// `override_name` and `env_name` are trimmed; blank values count as absent.
/// `log_file` is only read when neither is usable.
pub fn resolve(
    log_file: &Path,
    override_name: Option<&str>,
    env_name: Option<&str>,
) -> SelfIdentity {
    if let Some(name) = usable(override_name) {
        return SelfIdentity::found(name, IdentitySource::Override);
    }

    if let Some(name) = usable(env_name) {
        return SelfIdentity::found(name, IdentitySource::Environment);
    }

    match scan_log_for_self(log_file) {
        Some(name) => SelfIdentity::found(name, IdentitySource::LogScan),
        None => SelfIdentity::unknown(),
    }
}

fn usable(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Looks for the local user's name in the tail of `path`.
///
/// Each pattern is tried in priority order; within a pattern the most recent
/// occurrence wins so an account switch earlier in the session is not
/// reported.
pub fn scan_log_for_self(path: &Path) -> Option<String> {
    let rules = match compile_patterns(SELF_PATTERNS) {
        Ok(rules) => rules,
        Err(e) => {
            warn!(error = %e, "Self-identity patterns failed to compile");
            return None;
        }
    };

    let tail = match read_tail(path, SCAN_WINDOW_BYTES) {
        Ok(tail) => tail,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not read log tail for self identity");
            return None;
        }
    };

    let found = last_match(&rules, &tail);
    if let Some(name) = &found {
        debug!(path = %path.display(), name = %name, "Detected self identity from log");
    }
    found
}

/// Scans lines newest-first so the latest login line is preferred.
fn last_match(rules: &[Regex], text: &str) -> Option<String> {
    rules.iter().find_map(|rule| {
        text.lines()
            .rev()
            .find_map(|line| first_capture(std::slice::from_ref(rule), line))
    })
}

/// Reads at most the last `window` bytes of a file as lossy UTF-8.
fn read_tail(path: &Path, window: u64) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    file.seek(SeekFrom::Start(size.saturating_sub(window)))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
