use crate::{errors::QueryError, providers::db::storage::QueryExecutor};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{self, Debug};
use tracing::debug;
use turso::{Database, Value as TursoValue};

/// A query executor backed by a local SQLite database via Turso.
///
/// The provider holds a `Database` instance, which manages a connection
/// pool. When cloned, it shares the same underlying database, allowing for
/// concurrent access to the same database file or in-memory instance.
#[derive(Clone)]
pub struct SqliteExecutor {
    db: Database,
}

impl SqliteExecutor {
    /// Creates a new `SqliteExecutor` from a file path or in-memory.
    ///
    /// Use ":memory:" for a unique, isolated in-memory database. To share an
    /// in-memory database across multiple instances (e.g., in tests), create
    /// one executor and then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, QueryError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        // WAL mode improves concurrency for file-based databases and is a
        // no-op for in-memory ones. PRAGMA returns a row, so use `query`.
        let conn = db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// A helper for tests and seeding that executes multiple SQL statements.
    pub async fn batch_execute(&self, init_sql: &str) -> Result<(), QueryError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| QueryError::ExecutionFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Debug for SqliteExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteExecutor").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteExecutor {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

/// Converts a Turso value to a serde_json::Value.
fn turso_value_to_json(v: TursoValue) -> Value {
    match v {
        TursoValue::Null => Value::Null,
        TursoValue::Integer(i) => Value::Number(i.into()),
        TursoValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TursoValue::Text(s) => Value::String(s),
        TursoValue::Blob(_) => Value::String("<blob>".to_string()),
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn name(&self) -> &str {
        "SQLite"
    }

    /// Executes a read query on SQLite, returning one JSON object per row.
    async fn execute(&self, statement: &str) -> Result<Vec<Value>, QueryError> {
        debug!(statement = %statement, "--> Executing SQLite query");

        let conn = self
            .db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        let mut stmt = conn
            .prepare(statement)
            .await
            .map_err(|e| QueryError::ExecutionFailed(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| QueryError::ExecutionFailed(e.to_string()))?;

        let mut json_rows: Vec<Value> = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| QueryError::ExecutionFailed(e.to_string()))?
        {
            let mut row_map = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = row
                    .get_value(i)
                    .map_err(|e| QueryError::ExecutionFailed(e.to_string()))?;
                row_map.insert(name.clone(), turso_value_to_json(value));
            }
            json_rows.push(Value::Object(row_map));
        }

        Ok(json_rows)
    }
}
