use crate::{driver::Driver, Error, Result};

/// Resolves a driver by name and parses its data source.
pub(crate) fn driver(name: &str, data_source: &str) -> Result<Box<dyn Driver>> {
    match name {
        "postgres" | "postgresql" => connect_postgresql(data_source),
        "sqlite" | "sqlite3" => connect_sqlite(data_source),
        name => Err(Error::invalid_driver_configuration(format!(
            "unsupported database driver `{name}`"
        ))),
    }
}

#[cfg(feature = "postgresql")]
fn connect_postgresql(data_source: &str) -> Result<Box<dyn Driver>> {
    let driver = conduit_driver_postgresql::PostgreSQL::new(data_source)?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "postgresql"))]
fn connect_postgresql(_data_source: &str) -> Result<Box<dyn Driver>> {
    Err(Error::invalid_driver_configuration(
        "`postgresql` feature not enabled",
    ))
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(data_source: &str) -> Result<Box<dyn Driver>> {
    let driver = conduit_driver_sqlite::Sqlite::new(data_source)?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_data_source: &str) -> Result<Box<dyn Driver>> {
    Err(Error::invalid_driver_configuration(
        "`sqlite` feature not enabled",
    ))
}
