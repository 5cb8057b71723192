mod conn;
pub use conn::Conn;

mod context;
pub use context::Context;

pub mod db;
pub use db::{connect, connect_unchecked, max_retry_time, set_max_retry_time, Db};

mod failure;
pub use failure::{exit_on_failure, is_connection_failure, panic_on_failure, FailureFn};

mod savepoint;
pub use savepoint::generate_savepoint_id;

mod tx;
pub use tx::Tx;

mod watchdog;
pub use watchdog::{disable_timeouts, enable_timeouts, Policy};

pub use conduit_core::{
    bail, driver, err, Error, FromRow, FromValue, Result, Row, Statement, Value,
};
