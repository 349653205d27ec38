// ABOUTME: Tests for deploy lock acquisition, staleness, and forced breaking.
// ABOUTME: Runs against the fake host's model of noclobber file creation.

mod support;

use chrono::Utc;

use strofi::deploy::{DeployError, DeployErrorKind, DeployLock, LockInfo};
use strofi::types::AppName;

use support::fake_host::FakeHost;
use support::test_paths;

fn app() -> AppName {
    AppName::new("my-app").unwrap()
}

/// Test: acquiring the lock creates the lock file; releasing removes it.
#[tokio::test]
async fn acquire_and_release_manage_the_lock_file() {
    let host = FakeHost::new();
    let paths = test_paths();

    let lock = DeployLock::acquire(&host, &paths, &app(), false)
        .await
        .expect("first lock should succeed");

    assert!(host.exists(&paths.lock_file()));

    lock.release().await.expect("release should succeed");
    assert!(!host.exists(&paths.lock_file()));
}

/// Test: a held lock blocks a second acquisition and names the holder.
#[tokio::test]
async fn held_lock_blocks_second_acquisition() {
    let host = FakeHost::new();
    let paths = test_paths();

    let _lock = DeployLock::acquire(&host, &paths, &app(), false)
        .await
        .expect("first lock should succeed");

    let err = DeployLock::acquire(&host, &paths, &app(), false)
        .await
        .expect_err("second lock should fail");

    assert_eq!(err.kind(), DeployErrorKind::LockHeld);
    let info = err.lock_holder_info().expect("holder info should be present");
    assert!(!info.holder.is_empty());
    assert!(info.pid > 0);
}

/// Test: a stale lock (>1h) is auto-broken.
#[tokio::test]
async fn stale_lock_is_auto_broken() {
    let host = FakeHost::new();
    let paths = test_paths();

    let mut stale = LockInfo::new(&app());
    stale.started_at = Utc::now() - chrono::Duration::hours(2);
    host.add_file(&paths.lock_file(), &serde_json::to_string(&stale).unwrap());

    let lock = DeployLock::acquire(&host, &paths, &app(), false)
        .await
        .expect("stale lock should be broken");
    lock.release().await.unwrap();
}

/// Test: force breaks a fresh lock.
#[tokio::test]
async fn force_breaks_a_fresh_lock() {
    let host = FakeHost::new();
    let paths = test_paths();

    let fresh = LockInfo::new(&app());
    host.add_file(&paths.lock_file(), &serde_json::to_string(&fresh).unwrap());

    let lock = DeployLock::acquire(&host, &paths, &app(), true)
        .await
        .expect("forced acquisition should succeed");
    lock.release().await.unwrap();
}

/// Test: a corrupted lock file is broken rather than wedging deploys.
#[tokio::test]
async fn corrupted_lock_is_broken() {
    let host = FakeHost::new();
    let paths = test_paths();

    host.add_file(&paths.lock_file(), "not json at all");

    let lock = DeployLock::acquire(&host, &paths, &app(), false)
        .await
        .expect("corrupted lock should be broken");
    lock.release().await.unwrap();
}

/// Test: with_lock releases the lock even when the work fails.
#[tokio::test]
async fn with_lock_releases_on_failure() {
    let host = FakeHost::new();
    let paths = test_paths();

    let result: Result<(), DeployError> =
        DeployLock::with_lock(&host, &paths, &app(), false, async {
            Err(DeployError::SourceFetch {
                detail: "boom".to_string(),
            })
        })
        .await;

    assert!(result.is_err());
    assert!(
        !host.exists(&paths.lock_file()),
        "lock must be released after a failed deploy"
    );
}
