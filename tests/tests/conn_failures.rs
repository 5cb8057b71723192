#![cfg(feature = "sqlite")]

use conduit::{Conn, Db, Error};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// A path SQLite cannot create a database at.
fn unopenable() -> String {
    let dir = tempfile::tempdir().unwrap();
    dir.path()
        .join("missing")
        .join("test.db")
        .display()
        .to_string()
}

fn counting_builder(failures: &Arc<AtomicUsize>) -> conduit::db::Builder {
    let failures = failures.clone();
    let mut builder = Db::builder();
    builder.on_failure(move |_: &Db, err: &Error| {
        assert!(err.is_connection_failure());
        failures.fetch_add(1, Ordering::SeqCst);
    });
    builder
}

#[tokio::test]
async fn unchecked_connect_reports_failures_on_use() {
    let failures = Arc::new(AtomicUsize::new(0));
    let db = counting_builder(&failures)
        .connect_unchecked("sqlite", &unopenable())
        .unwrap();

    let err = db.exec("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connection_failure());
    assert!(conduit::is_connection_failure(&err));
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    assert!(db.begin().await.is_err());
    assert_eq!(failures.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn statement_errors_skip_the_callback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let failures = Arc::new(AtomicUsize::new(0));
    let db = counting_builder(&failures)
        .connect("sqlite", &path.display().to_string())
        .await
        .unwrap();

    let err = db.exec("SELECT * FROM missing_table", &[]).await.unwrap_err();
    assert!(!err.is_connection_failure());

    let tx = db.begin().await.unwrap();
    assert!(tx.exec("NOT SQL", &[]).await.is_err());
    tx.rollback().await.unwrap();
    tx.close().await.unwrap();

    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn checked_connect_gives_up_after_ceiling() {
    let failures = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let err = counting_builder(&failures)
        .max_retry_time(Duration::from_millis(300))
        .connect("sqlite", &unopenable())
        .await
        .unwrap_err();

    assert!(err.is_connection_failed());
    assert!(err.is_connection_failure());
    assert!(err
        .to_string()
        .starts_with("could not connect to database after retrying for 300ms"));
    assert!(started.elapsed() < Duration::from_secs(5));

    // Pinging while connecting does not count as a failure
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn config_errors_fail_immediately() {
    let started = Instant::now();

    let err = conduit::connect("oracle", "oracle://localhost", 0, 0)
        .await
        .unwrap_err();
    assert!(err.is_invalid_driver_configuration());
    assert!(err.is_config_error());

    let err = conduit::connect("sqlite", "", 0, 0).await.unwrap_err();
    assert!(err.is_invalid_connection_url());

    let err = conduit::connect_unchecked("sqlite", "mysql://localhost/app", 0, 0).unwrap_err();
    assert!(err.is_invalid_connection_url());
    assert!(!err.is_connection_failure());

    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn pool_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db").display().to_string();

    let db = conduit::connect("sqlite", &path, 4, 2).await.unwrap();
    assert_eq!(db.status().max_size, 4);

    db.set_max_open(8);
    assert_eq!(db.status().max_size, 8);
    db.set_max_idle(1);

    // Hold three connections, then give them back
    let txs = [
        db.begin().await.unwrap(),
        db.begin().await.unwrap(),
        db.begin().await.unwrap(),
    ];
    for tx in &txs {
        tx.rollback().await.unwrap();
        tx.close().await.unwrap();
    }
    assert!(db.status().available <= 1);
}

#[tokio::test]
async fn in_memory_database_is_kept_alive() {
    let db = conduit::connect("sqlite", ":memory:", 0, 0).await.unwrap();
    assert_eq!(db.status().max_size, 1);

    db.exec("CREATE TABLE items (id INTEGER PRIMARY KEY)", &[])
        .await
        .unwrap();
    db.exec("INSERT INTO items (id) VALUES (1)", &[]).await.unwrap();
    let count: i64 = db.get("SELECT COUNT(*) FROM items", &[]).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn wait_timeout_bounds_checkout() {
    let db = Db::builder()
        .wait_timeout(Duration::from_millis(50))
        .connect("sqlite", ":memory:")
        .await
        .unwrap();

    let tx = db.begin().await.unwrap();
    let err = db.exec("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connection_failure());

    tx.rollback().await.unwrap();
    tx.close().await.unwrap();
    db.exec("SELECT 1", &[]).await.unwrap();
}

#[tokio::test]
#[should_panic(expected = "connection failure")]
async fn panic_on_failure_panics() {
    let db = Db::builder()
        .on_failure_fn(conduit::panic_on_failure())
        .connect_unchecked("sqlite", &unopenable())
        .unwrap();

    let _ = db.exec("SELECT 1", &[]).await;
}

#[test]
fn process_wide_retry_ceiling() {
    let previous = conduit::max_retry_time();
    assert_eq!(previous, Duration::from_secs(15 * 60));

    conduit::set_max_retry_time(Duration::from_secs(2));
    assert_eq!(conduit::max_retry_time(), Duration::from_secs(2));

    conduit::set_max_retry_time(previous);
}
