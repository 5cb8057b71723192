use conduit::Conn;
use std::time::Duration;
use tests::{ExecLog, Test};

async fn wait_for_rollback(log: &ExecLog) {
    for _ in 0..100 {
        if log.rollbacks() > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("dropped transaction was not rolled back");
}

async fn dropped_tx_rolls_back(test: Test) {
    let users = test.users().await;

    let tx = test.db().begin().await.unwrap();
    tx.exec(
        &format!("INSERT INTO {users} (id, name) VALUES ($1, $2)"),
        &[1.into(), "alice".into()],
    )
    .await
    .unwrap();
    drop(tx);

    wait_for_rollback(test.log()).await;
    assert_eq!(test.count(&users).await, 0);
}

async fn dropping_one_clone_keeps_tx_open(test: Test) {
    let tx = test.db().begin().await.unwrap();
    let inner = tx.begin().await.unwrap();
    drop(inner);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(test.log().rollbacks(), 0);
    assert!(tx.is_active().await);

    // Dropping a handle does not close its level
    assert_eq!(tx.depth().await, 1);
    tx.rollback().await.unwrap();
    tx.close().await.unwrap();
}

async fn finished_tx_drops_quietly(test: Test) {
    let tx = test.db().begin().await.unwrap();
    tx.commit().await.unwrap();
    tx.close().await.unwrap();
    drop(tx);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(test.log().rollbacks(), 0);
    assert_eq!(test.log().commits(), 1);
}

tests::tests!(
    dropped_tx_rolls_back,
    dropping_one_clone_keeps_tx_open,
    finished_tx_drops_quietly,
);
