#![cfg(feature = "sqlite")]

use conduit::{Conn, Policy};
use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Collects formatted log output.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.lock().unwrap());
        String::from_utf8(bytes).unwrap()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const REPORT: &str = "transaction lifetime exceeded timeout";

// Timeout settings are process wide, so every case runs in this one test.
#[tokio::test]
async fn long_transactions_are_reported() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let db = conduit::connect("sqlite", ":memory:", 0, 0).await.unwrap();
    let wait = Duration::from_millis(300);

    // Reported with the place the transaction began
    conduit::enable_timeouts(Duration::from_millis(50), Policy::Report);
    let tx = db.begin().await.unwrap();
    tokio::time::sleep(wait).await;
    let logs = capture.take();
    assert!(logs.contains(REPORT), "{logs}");
    assert!(logs.contains("tx_timeouts.rs:"), "{logs}");
    tx.commit().await.unwrap();
    tx.close().await.unwrap();

    // Finished in time
    let tx = db.begin().await.unwrap();
    tx.commit().await.unwrap();
    tx.close().await.unwrap();
    tokio::time::sleep(wait).await;
    assert!(!capture.take().contains(REPORT));

    // Rolled back in time
    let tx = db.begin().await.unwrap();
    tx.rollback().await.unwrap();
    tx.close().await.unwrap();
    tokio::time::sleep(wait).await;
    assert!(!capture.take().contains(REPORT));

    // Disabled while the transaction is open
    let tx = db.begin().await.unwrap();
    conduit::disable_timeouts();
    tokio::time::sleep(wait).await;
    assert!(!capture.take().contains(REPORT));
    tx.rollback().await.unwrap();
    tx.close().await.unwrap();

    // A zero duration does not enable anything
    conduit::enable_timeouts(Duration::ZERO, Policy::Report);
    let tx = db.begin().await.unwrap();
    tokio::time::sleep(wait).await;
    assert!(!capture.take().contains(REPORT));
    tx.rollback().await.unwrap();
    tx.close().await.unwrap();
}
