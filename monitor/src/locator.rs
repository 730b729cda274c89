//! Discovery of the live VRChat log file.
//!
//! VRChat starts a new `output_log_*.txt` each session, and depending on how
//! it was installed that file can live in one of several directories. The
//! locator scans every candidate directory and returns the most recently
//! modified match. It keeps no state between calls, so the follow loop can
//! call it periodically to notice rotation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::Pattern;
use tracing::{debug, trace, warn};

/// A place a log file might live: a directory plus file name globs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCandidate {
    /// Directory to search (not recursive).
    pub dir: PathBuf,
    /// File name patterns matched against entries of `dir`.
    pub globs: Vec<String>,
}

impl LogCandidate {
    /// Creates a candidate from a directory and its file name globs.
    pub fn new(dir: impl Into<PathBuf>, globs: &[&str]) -> Self {
        Self {
            dir: dir.into(),
            globs: globs.iter().map(|g| (*g).to_string()).collect(),
        }
    }
}

/// A located log file and the modification time observed when it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLogFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Returns the newest file matching any candidate, or `None` if there is none.
///
/// Missing candidate directories are skipped, as are entries that disappear
/// between listing and `stat`. When two files share a modification time the
/// one encountered last wins.
pub fn locate(candidates: &[LogCandidate]) -> Option<ResolvedLogFile> {
    let mut latest: Option<ResolvedLogFile> = None;

    for candidate in candidates {
        if !candidate.dir.is_dir() {
            trace!(dir = %candidate.dir.display(), "Candidate directory missing");
            continue;
        }

        let patterns = compile_globs(&candidate.globs);
        for path in matching_entries(&candidate.dir, &patterns) {
            let modified = match fs::metadata(&path).and_then(|meta| meta.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    trace!(path = %path.display(), error = %e, "Entry vanished before stat");
                    continue;
                }
            };

            if latest.as_ref().is_none_or(|best| modified >= best.modified) {
                latest = Some(ResolvedLogFile { path, modified });
            }
        }
    }

    if let Some(found) = &latest {
        debug!(path = %found.path.display(), "Located newest log file");
    }

    latest
}

fn compile_globs(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(glob = %glob, error = %e, "Ignoring invalid log glob");
                None
            }
        })
        .collect()
}

/// Lists regular files in `dir` whose names match one of `patterns`.
fn matching_entries(dir: &Path, patterns: &[Pattern]) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to list candidate directory");
            return Vec::new();
        }
    };

    entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| patterns.iter().any(|p| p.matches(name)))
        })
        .map(|entry| entry.path())
        .collect()
}
