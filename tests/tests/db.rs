use conduit::{Conn, Error, FromRow, Result, Row, Value};
use pretty_assertions::assert_eq;
use tests::{Op, Test};

#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    name: String,
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(User {
            id: row.get_named("id")?,
            name: row.get_named("name")?,
        })
    }
}

async fn seed(test: &Test) -> String {
    let users = test.users().await;
    let insert = format!("INSERT INTO {users} (id, name) VALUES ($1, $2), ($3, $4)");
    let params: [Value; 4] = [1.into(), "alice".into(), 2.into(), "bob".into()];
    assert_eq!(test.db().exec(&insert, &params).await.unwrap(), 2);
    users
}

async fn exec_and_query(test: Test) {
    let users = seed(&test).await;

    let rows = test
        .db()
        .query(&format!("SELECT id, name FROM {users} ORDER BY id"), &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0].columns()[..], ["id", "name"]);
    assert_eq!(rows[1].get::<String>(1).unwrap(), "bob");

    let updated = test
        .db()
        .exec(&format!("UPDATE {users} SET name = $1"), &["carol".into()])
        .await
        .unwrap();
    assert_eq!(updated, 2);
}

async fn get_and_select(test: Test) {
    let users = seed(&test).await;
    let db = test.db();

    let name: String = db
        .get(&format!("SELECT name FROM {users} WHERE id = $1"), &[2.into()])
        .await
        .unwrap();
    assert_eq!(name, "bob");

    let pair: (i64, String) = db
        .get(&format!("SELECT id, name FROM {users} WHERE id = $1"), &[1.into()])
        .await
        .unwrap();
    assert_eq!(pair, (1, "alice".to_string()));

    let all: Vec<User> = db
        .select(&format!("SELECT id, name FROM {users} ORDER BY id"), &[])
        .await
        .unwrap();
    assert_eq!(
        all,
        [
            User { id: 1, name: "alice".into() },
            User { id: 2, name: "bob".into() },
        ]
    );

    let none: Vec<User> = db
        .select(&format!("SELECT id, name FROM {users} WHERE id > $1"), &[10.into()])
        .await
        .unwrap();
    assert!(none.is_empty());
}

async fn query_row_not_found(test: Test) {
    let users = test.users().await;
    let sql = format!("SELECT name FROM {users} WHERE id = $1");

    let err = test.db().query_row(&sql, &[1.into()]).await.unwrap_err();
    assert!(err.is_record_not_found());
    assert!(!err.is_connection_failure());

    let err = test.db().get::<String>(&sql, &[1.into()]).await.unwrap_err();
    assert!(err.is_record_not_found());

    let missing: Option<String> = test
        .db()
        .get(&format!("SELECT MAX(name) FROM {users}"), &[])
        .await
        .unwrap();
    assert_eq!(missing, None);
}

async fn statement_errors_are_not_connection_failures(test: Test) {
    let users = seed(&test).await;

    let err = test
        .db()
        .exec(&format!("INSERT INTO {users} (id, name) VALUES ($1, $2)"), &[1.into(), "dup".into()])
        .await
        .unwrap_err();
    assert!(!err.is_connection_failure());

    let err = test.db().exec("NOT SQL AT ALL", &[]).await.unwrap_err();
    assert!(!err.is_connection_failure());

    // The pool keeps working
    assert_eq!(test.count(&users).await, 2);
}

async fn prepare(test: Test) {
    let users = test.users().await;
    let stmt = test
        .db()
        .prepare(&format!("SELECT id, name FROM {users} WHERE id = $1"))
        .await
        .unwrap();
    assert_eq!(stmt.params(), 1);
    assert_eq!(&stmt.columns()[..], ["id", "name"]);
    assert!(stmt.sql().contains(&users));
}

async fn transaction_control_on_db_is_noop(test: Test) {
    let db = test.db();
    db.commit().await.unwrap();
    db.rollback().await.unwrap();
    db.commit().await.unwrap();
    assert!(!db.is_rolled_back());
    assert!(db.context().is_none());
    assert!(test.log().is_empty());
}

async fn name_is_data_source(test: Test) {
    let tx = test.db().begin().await.unwrap();
    assert!(!test.db().name().is_empty());
    assert_eq!(tx.name(), test.db().name());
    tx.close().await.unwrap();
}

async fn begin_reaches_backend_once(test: Test) {
    let tx = test.db().begin().await.unwrap();
    assert_eq!(test.log().pop(), Some(Op::Begin));
    assert!(tx.is_active().await);

    let nested = tx.begin().await.unwrap();
    assert!(test.log().is_empty());

    nested.commit().await.unwrap();
    nested.close().await.unwrap();
    tx.commit().await.unwrap();
    assert!(!tx.is_active().await);
    assert_eq!(test.log().pop(), Some(Op::Commit));

    // Statements after the real commit fail
    let err: Error = tx.exec("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_already_committed());
    assert!(tx.commit().await.unwrap_err().is_already_committed());
    assert!(tx.rollback().await.unwrap_err().is_already_committed());
    assert!(tx.begin().await.unwrap_err().is_already_committed());
    tx.close().await.unwrap();
}

async fn closed_pool_fails(test: Test) {
    let db = test.db().clone();
    db.close().await.unwrap();
    assert!(db.is_closed());

    let err = db.exec("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connection_failure());
    assert!(db.begin().await.is_err());
}

tests::tests!(
    exec_and_query,
    get_and_select,
    query_row_not_found,
    statement_errors_are_not_connection_failures,
    prepare,
    transaction_control_on_db_is_noop,
    name_is_data_source,
    begin_reaches_backend_once,
    closed_pool_fails,
);
