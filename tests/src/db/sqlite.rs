use conduit::driver::Driver;
use conduit_driver_sqlite::Sqlite;
use tempfile::TempDir;

use crate::Setup;

/// Every test gets its own database file, removed with the directory.
pub struct SetupSqlite {
    dir: TempDir,
}

impl SetupSqlite {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }
}

impl Default for SetupSqlite {
    fn default() -> Self {
        Self::new()
    }
}

impl Setup for SetupSqlite {
    fn driver(&self) -> Box<dyn Driver> {
        Box::new(Sqlite::open(self.dir.path().join("test.db")))
    }
}
