use std::collections::HashMap;

use tokio_postgres::{Client, Error, Statement};

/// Prepared statements of one connection, keyed by SQL text.
#[derive(Debug, Clone, Default)]
pub struct StatementCache {
    map: HashMap<String, Statement>,
}

impl StatementCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &str) -> Option<Statement> {
        self.map.get(query).map(ToOwned::to_owned)
    }

    pub async fn prepare(&mut self, client: &Client, query: &str) -> Result<Statement, Error> {
        if let Some(statement) = self.get(query) {
            Ok(statement)
        } else {
            let statement = client.prepare(query).await?;
            self.map.insert(query.to_string(), statement.clone());
            Ok(statement)
        }
    }
}
