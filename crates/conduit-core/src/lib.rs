pub mod driver;
pub use driver::{Connection, Driver, Statement};

mod error;
pub use error::{Error, IntoError};

mod row;
pub use row::{FromRow, Row};

pub mod sqlstate;

mod value;
pub use value::{FromValue, Value};

/// A Result type alias that uses Conduit's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
