use crate::{Context, Error, FromRow, Result, Row, Statement, Tx, Value};

use std::future::Future;

/// Statement execution and transaction control shared by [`Db`](crate::Db)
/// and [`Tx`].
///
/// Code written against `Conn` runs unchanged on a pool, inside a
/// transaction, or inside a transaction nested in another one. Calling
/// [`begin`](Conn::begin) on a transaction nests: only the outermost
/// begin/commit pair reaches the database.
///
/// ```no_run
/// use conduit::{Conn, Result};
///
/// async fn transfer(conn: &impl Conn, from: i64, to: i64, amount: i64) -> Result<()> {
///     let tx = conn.begin().await?;
///     let result = async {
///         tx.exec("UPDATE accounts SET balance = balance - $1 WHERE id = $2", &[amount.into(), from.into()]).await?;
///         tx.exec("UPDATE accounts SET balance = balance + $1 WHERE id = $2", &[amount.into(), to.into()]).await?;
///         tx.commit().await
///     }
///     .await;
///     tx.close().await?;
///     result
/// }
/// ```
pub trait Conn: Send + Sync {
    /// Name of the data source.
    fn name(&self) -> &str;

    /// The context bound to this handle, if any.
    fn context(&self) -> Option<&Context>;

    /// Starts a transaction, or a nested level of the current one.
    #[track_caller]
    fn begin(&self) -> impl Future<Output = Result<Tx>> + Send;

    /// Like [`begin`](Conn::begin), binding `cx` to the transaction. Every
    /// later backend call on the transaction runs under `cx`.
    #[track_caller]
    fn begin_with_context(&self, cx: &Context) -> impl Future<Output = Result<Tx>> + Send;

    /// Executes a statement, returning the number of affected rows.
    fn exec(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<u64>> + Send;

    fn query(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<Vec<Row>>> + Send;

    /// Returns the first row of the result, failing with a record-not-found
    /// error when there is none.
    fn query_row(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<Row>> + Send {
        async move {
            self.query(sql, params)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::record_not_found(sql))
        }
    }

    fn prepare(&self, sql: &str) -> impl Future<Output = Result<Statement>> + Send;

    /// Reads a single row into `T`.
    fn get<T: FromRow + Send>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<T>> + Send {
        async move { T::from_row(&self.query_row(sql, params).await?) }
    }

    /// Reads every row into a `T`.
    fn select<T: FromRow + Send>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<T>>> + Send {
        async move {
            self.query(sql, params)
                .await?
                .iter()
                .map(T::from_row)
                .collect()
        }
    }

    fn commit(&self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(&self) -> impl Future<Output = Result<()>> + Send;

    /// Ends the current level. On a transaction level that was neither
    /// committed nor rolled back this rolls the transaction back.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;

    fn is_rolled_back(&self) -> bool;

    /// Creates a savepoint and returns its name.
    fn savepoint(&self) -> impl Future<Output = Result<String>> + Send;

    fn rollback_to(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    fn release_savepoint(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}
