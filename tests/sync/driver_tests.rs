// Tests for the synchronization driver
// Polling is exercised through a sleeper that stops after a fixed number of cycles

use std::fs;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use mirrorsync::sync::{DriverState, ErrorPolicy, Sleeper, SyncDriver, SyncEvent};
use mirrorsync::SyncError;
use tempfile::tempdir;

use super::{mutations, snapshot, write_file};

/// Records requested sleeps and stops the loop after `limit` of them.
struct CountingSleeper {
    limit: usize,
    slept: Vec<Duration>,
}

impl CountingSleeper {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            slept: Vec::new(),
        }
    }
}

impl Sleeper for CountingSleeper {
    fn sleep(&mut self, duration: Duration) -> ControlFlow<()> {
        self.slept.push(duration);
        if self.slept.len() >= self.limit {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

#[test]
fn test_single_pass_creates_replica_and_converges() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    let replica = dir.path().join("replica");
    write_file(&source, "a.txt", "hello");
    write_file(&source, "sub/b.txt", "world");

    let mut driver = SyncDriver::new(&source, &replica, 0);
    let mut events: Vec<SyncEvent> = Vec::new();
    let summary = driver.run(&mut events).unwrap();

    assert_eq!(summary.passes, 1);
    assert_eq!(summary.last.added, 2);
    assert_eq!(driver.state(), DriverState::Done);
    assert_eq!(snapshot(&replica), snapshot(&source));
    assert!(!events.iter().any(|e| matches!(e, SyncEvent::Sleeping { .. })));
}

#[test]
fn test_events_carry_absolute_roots() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    let replica = dir.path().join("replica");
    write_file(&source, "a.txt", "hello");

    let mut events: Vec<SyncEvent> = Vec::new();
    SyncDriver::new(&source, &replica, 0).run(&mut events).unwrap();

    let replica_abs = fs::canonicalize(&replica).unwrap();
    assert_eq!(
        events,
        vec![
            SyncEvent::Comparing {
                replica: replica_abs.clone(),
                source: fs::canonicalize(&source).unwrap(),
            },
            SyncEvent::Adding { path: replica_abs.join("a.txt") },
        ]
    );
}

#[test]
fn test_polling_sleeps_between_passes() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    let replica = dir.path().join("replica");
    write_file(&source, "a.txt", "hello");

    let mut driver = SyncDriver::new(&source, &replica, 5);
    let mut sleeper = CountingSleeper::new(3);
    let mut events: Vec<SyncEvent> = Vec::new();
    let summary = driver.run_with_sleeper(&mut events, &mut sleeper).unwrap();

    assert_eq!(summary.passes, 3);
    assert_eq!(sleeper.slept, vec![Duration::from_secs(5); 3]);
    assert_eq!(driver.state(), DriverState::Done);

    let rendered: Vec<String> = events
        .iter()
        .filter(|e| !e.is_mutation())
        .map(|e| e.to_string())
        .collect();
    assert_eq!(rendered.len(), 6);
    for pair in rendered.chunks(2) {
        assert!(pair[0].starts_with("comparing "));
        assert_eq!(pair[1], "sleeping 5 seconds");
    }
    // Only the first pass had anything to do
    assert_eq!(mutations(&events).len(), 1);
}

#[test]
fn test_polling_picks_up_source_changes() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    let replica = dir.path().join("replica");
    write_file(&source, "a.txt", "v1");

    struct EditingSleeper {
        source: PathBuf,
        cycles: usize,
    }

    impl Sleeper for EditingSleeper {
        fn sleep(&mut self, _duration: Duration) -> ControlFlow<()> {
            self.cycles += 1;
            match self.cycles {
                1 => {
                    fs::write(self.source.join("a.txt"), "v2").unwrap();
                    ControlFlow::Continue(())
                }
                _ => ControlFlow::Break(()),
            }
        }
    }

    let mut sleeper = EditingSleeper {
        source: source.clone(),
        cycles: 0,
    };
    let mut events: Vec<SyncEvent> = Vec::new();
    SyncDriver::new(&source, &replica, 1)
        .run_with_sleeper(&mut events, &mut sleeper)
        .unwrap();

    let replica_abs = fs::canonicalize(&replica).unwrap();
    assert_eq!(
        mutations(&events),
        vec![
            SyncEvent::Adding { path: replica_abs.join("a.txt") },
            SyncEvent::Updating { path: replica_abs.join("a.txt") },
        ]
    );
    assert_eq!(fs::read_to_string(replica.join("a.txt")).unwrap(), "v2");
}

#[test]
fn test_source_file_is_fatal() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    fs::write(&source, "not a directory").unwrap();

    let mut driver = SyncDriver::new(&source, dir.path().join("replica"), 0);
    let err = driver.run(&mut Vec::<SyncEvent>::new()).unwrap_err();

    assert!(matches!(err, SyncError::SourceNotDirectory { .. }));
    assert!(err.is_startup());
    assert_eq!(driver.state(), DriverState::Fatal);
}

#[test]
fn test_replica_file_is_fatal() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    fs::create_dir(&source).unwrap();
    let replica = dir.path().join("replica");
    fs::write(&replica, "occupied").unwrap();

    let err = SyncDriver::new(&source, &replica, 0)
        .run(&mut Vec::<SyncEvent>::new())
        .unwrap_err();

    assert!(matches!(err, SyncError::ReplicaNotDirectory { .. }));
    assert_eq!(fs::read_to_string(&replica).unwrap(), "occupied");
}

#[test]
fn test_replica_parent_must_exist() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    fs::create_dir(&source).unwrap();

    let err = SyncDriver::new(&source, dir.path().join("missing/replica"), 0)
        .run(&mut Vec::<SyncEvent>::new())
        .unwrap_err();

    assert!(matches!(err, SyncError::ReplicaCreate { .. }));
    assert!(err.is_startup());
}

#[cfg(unix)]
#[test]
fn test_abort_policy_ends_polling_on_failure() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    fs::create_dir(&source).unwrap();
    std::os::unix::fs::symlink(dir.path().join("nowhere"), source.join("dangling")).unwrap();

    let mut driver =
        SyncDriver::new(&source, dir.path().join("replica"), 2).with_error_policy(ErrorPolicy::Abort);
    let mut sleeper = CountingSleeper::new(5);
    let err = driver.run_with_sleeper(&mut Vec::<SyncEvent>::new(), &mut sleeper).unwrap_err();

    assert!(!err.is_startup());
    assert!(sleeper.slept.is_empty());
    assert_eq!(driver.state(), DriverState::Fatal);
}

#[cfg(unix)]
#[test]
fn test_continue_policy_keeps_polling() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    fs::create_dir(&source).unwrap();
    std::os::unix::fs::symlink(dir.path().join("nowhere"), source.join("dangling")).unwrap();

    let mut driver = SyncDriver::new(&source, dir.path().join("replica"), 2)
        .with_error_policy(ErrorPolicy::Continue);
    let mut sleeper = CountingSleeper::new(2);
    let mut events: Vec<SyncEvent> = Vec::new();
    let summary = driver.run_with_sleeper(&mut events, &mut sleeper).unwrap();

    assert_eq!(summary.passes, 0);
    assert_eq!(summary.failed_passes, 2);
    let failures = events
        .iter()
        .filter(|e| matches!(e, SyncEvent::PassFailed { .. }))
        .count();
    assert_eq!(failures, 2);
}

#[cfg(unix)]
#[test]
fn test_continue_policy_still_fails_single_pass() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    fs::create_dir(&source).unwrap();
    std::os::unix::fs::symlink(dir.path().join("nowhere"), source.join("dangling")).unwrap();

    let mut driver = SyncDriver::new(&source, dir.path().join("replica"), 0)
        .with_error_policy(ErrorPolicy::Continue);

    assert!(driver.run(&mut Vec::<SyncEvent>::new()).is_err());
    assert_eq!(driver.state(), DriverState::Fatal);
}

#[test]
fn test_events_forwarded_over_channel() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    write_file(&source, "a.txt", "hello");
    let replica = dir.path().join("replica");

    let (mut tx, rx) = crossbeam_channel::unbounded::<SyncEvent>();
    let handle = std::thread::spawn(move || {
        SyncDriver::new(&source, &replica, 0).run(&mut tx).map(|s| s.passes)
    });

    assert_eq!(handle.join().unwrap().unwrap(), 1);
    let received: Vec<SyncEvent> = rx.iter().collect();
    assert_eq!(received.len(), 2);
    assert!(matches!(received[1], SyncEvent::Adding { .. }));
}
