//! Integration tests for the end-to-end join notification flow.
//!
//! These tests drive [`Follower::run`] against real files in a temporary
//! directory, with a recording notifier standing in for `notify-send`.
//! Writers and the follow loop share one task via `tokio::join!`, the same way
//! the binary runs on a current-thread runtime.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use joinwatch_monitor::classifier::Classifier;
use joinwatch_monitor::config::{Config, LOG_GLOBS};
use joinwatch_monitor::follow::{FollowEvent, Follower};
use joinwatch_monitor::identity::{self, IdentitySource};
use joinwatch_monitor::locator::{self, LogCandidate};
use joinwatch_monitor::notifier::{Notifier, NotifyError};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::time::sleep;

// =============================================================================
// Test Helpers
// =============================================================================

/// Poll interval used by the follow loop in these tests.
const POLL: Duration = Duration::from_millis(10);

/// Time given to the loop to pick up freshly written lines.
const SETTLE: Duration = Duration::from_millis(150);

/// Records notifications instead of showing them.
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    fn bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

fn config_for(dir: &Path, rotation_check_interval: Duration) -> Config {
    Config {
        title: "VRChat".to_string(),
        icon: None,
        sound: None,
        self_name: None,
        candidates: vec![LogCandidate::new(dir, LOG_GLOBS)],
        poll_interval: POLL,
        rotation_check_interval,
    }
}

fn append_line(path: &Path, line: &str) {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .expect("Failed to open log");
    writeln!(file, "{line}").expect("Failed to append");
}

fn create_empty_log(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).expect("Failed to create log");
    path
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_self_join_skipped_and_other_join_notified() {
    let dir = TempDir::new().unwrap();
    let log = create_empty_log(dir.path(), "output_log_2024-05-01_21-00-00.txt");
    let config = config_for(dir.path(), Duration::from_secs(5));

    let resolved = locator::locate(&config.candidates).expect("log should be found");
    assert_eq!(resolved.path, log);

    let identity = identity::resolve(&resolved.path, Some("Alice"), None);
    let notifier = RecordingNotifier::default();
    let mut follower = Follower::new(
        config,
        Classifier::builtin().unwrap(),
        identity,
        notifier.clone(),
        resolved.path,
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut events = Vec::new();

    let writer = async {
        sleep(SETTLE).await;
        append_line(&log, r#"OnPlayerJoined displayName":"Alice""#);
        sleep(SETTLE).await;
        append_line(&log, r#"OnPlayerJoined displayName":"Bob""#);
        sleep(SETTLE).await;
        let _ = stop_tx.send(());
    };

    let shutdown = async {
        let _ = stop_rx.await;
    };

    let (result, ()) = tokio::join!(
        follower.run(shutdown, |event| events.push(event.clone())),
        writer
    );

    result.expect("follow loop should stop cleanly");
    assert_eq!(
        *notifier.sent.lock().unwrap(),
        vec![("VRChat".to_string(), "Player joined: Bob".to_string())]
    );
    assert_eq!(
        events,
        vec![
            FollowEvent::Following(log.clone()),
            FollowEvent::Skipped {
                name: "Alice".to_string()
            },
            FollowEvent::Joined {
                name: Some("Bob".to_string()),
                warnings: Vec::new(),
            },
        ]
    );
}

// =============================================================================
// Rotation
// =============================================================================

#[tokio::test]
async fn test_run_follows_rotation_without_redelivery() {
    let dir = TempDir::new().unwrap();
    let first = create_empty_log(dir.path(), "output_log_1.txt");
    let second = dir.path().join("output_log_2.txt");
    let notifier = RecordingNotifier::default();
    let mut follower = Follower::new(
        config_for(dir.path(), Duration::from_millis(50)),
        Classifier::builtin().unwrap(),
        identity::resolve(&first, None, None),
        notifier.clone(),
        first.clone(),
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut events = Vec::new();

    let writer = async {
        sleep(SETTLE).await;
        append_line(&first, r#"OnPlayerJoined displayName":"A""#);
        append_line(&first, r#"OnPlayerJoined displayName":"B""#);
        sleep(SETTLE).await;

        let file = File::create(&second).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(3600))
            .unwrap();
        drop(file);
        // Several rotation intervals, so the switch has happened.
        sleep(SETTLE * 2).await;

        append_line(&second, r#"OnPlayerJoined displayName":"C""#);
        append_line(&second, r#"OnPlayerJoined displayName":"D""#);
        sleep(SETTLE).await;
        let _ = stop_tx.send(());
    };

    let shutdown = async {
        let _ = stop_rx.await;
    };

    let (result, ()) = tokio::join!(
        follower.run(shutdown, |event| events.push(event.clone())),
        writer
    );

    result.expect("follow loop should stop cleanly");
    assert_eq!(
        notifier.bodies(),
        vec![
            "Player joined: A",
            "Player joined: B",
            "Player joined: C",
            "Player joined: D",
        ]
    );
    assert!(events.contains(&FollowEvent::Switched {
        from: first.clone(),
        to: second.clone(),
    }));
}

#[tokio::test]
async fn test_run_reports_open_failure() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("output_log_missing.txt");
    let mut follower = Follower::new(
        config_for(dir.path(), Duration::from_secs(5)),
        Classifier::builtin().unwrap(),
        identity::SelfIdentity::unknown(),
        RecordingNotifier::default(),
        missing,
    );

    let result = follower
        .run(std::future::pending::<()>(), |_| {})
        .await;

    assert!(result.is_err());
}

// =============================================================================
// Self-identity fallback order
// =============================================================================

#[test]
fn test_identity_fallback_order() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("output_log_1.txt");
    fs::write(
        &log,
        "2024.05.01 21:00:00 Log        -  User Authenticated: Carol (usr_0123abcd-aaaa-bbbb-cccc-0123456789ab)\n",
    )
    .unwrap();

    let all = identity::resolve(&log, Some("Alice"), Some("Bob"));
    assert_eq!(all.name(), Some("Alice"));
    assert_eq!(all.source(), IdentitySource::Override);

    let env_and_scan = identity::resolve(&log, None, Some("Bob"));
    assert_eq!(env_and_scan.name(), Some("Bob"));
    assert_eq!(env_and_scan.source(), IdentitySource::Environment);

    let scan_only = identity::resolve(&log, None, None);
    assert_eq!(scan_only.name(), Some("Carol"));
    assert_eq!(scan_only.source(), IdentitySource::LogScan);

    fs::write(&log, "Entering Room: Home\n").unwrap();
    let nothing = identity::resolve(&log, None, None);
    assert_eq!(nothing.name(), None);
    assert_eq!(nothing.source(), IdentitySource::Unknown);
    assert!(!nothing.is_self("Carol"));
}
