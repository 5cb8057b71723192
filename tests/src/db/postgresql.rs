use conduit::driver::Driver;
use conduit_driver_postgresql::PostgreSQL;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_postgres::NoTls;

use crate::Setup;

static NEXT_SETUP: AtomicU32 = AtomicU32::new(0);

pub fn url() -> String {
    std::env::var("CONDUIT_TEST_POSTGRES_URL")
        .unwrap_or_else(|_| "postgresql://localhost:5432/conduit_test".to_string())
}

/// Tests share one server, so every setup creates its tables under a
/// prefix unique to the process and the test.
pub struct SetupPostgreSQL {
    prefix: String,
}

impl SetupPostgreSQL {
    pub fn new() -> Self {
        let n = NEXT_SETUP.fetch_add(1, Ordering::Relaxed);
        Self {
            prefix: format!("t{}_{n}_", std::process::id()),
        }
    }
}

impl Default for SetupPostgreSQL {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Setup for SetupPostgreSQL {
    fn driver(&self) -> Box<dyn Driver> {
        Box::new(PostgreSQL::new(url()).expect("invalid CONDUIT_TEST_POSTGRES_URL"))
    }

    fn table_prefix(&self) -> String {
        self.prefix.clone()
    }

    async fn cleanup_my_tables(&self) -> conduit::Result<()> {
        drop_tables(&self.prefix)
            .await
            .map_err(|e| conduit::err!("PostgreSQL cleanup failed: {e}"))
    }
}

async fn drop_tables(prefix: &str) -> Result<(), tokio_postgres::Error> {
    let (client, connection) = tokio_postgres::connect(&url(), NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("PostgreSQL connection error during cleanup: {e}");
        }
    });

    // `_` is a LIKE wildcard, so match the prefix exactly instead
    let tables = client
        .query(
            "SELECT table_name::TEXT FROM information_schema.tables
             WHERE table_schema = 'public' AND left(table_name, length($1::TEXT)) = $1::TEXT",
            &[&prefix],
        )
        .await?;

    for table in tables {
        let name: String = table.get(0);
        client
            .batch_execute(&format!("DROP TABLE IF EXISTS \"{name}\" CASCADE"))
            .await?;
    }

    Ok(())
}
