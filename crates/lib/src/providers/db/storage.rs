use crate::errors::QueryError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::Value;
use std::fmt::Debug;

/// A trait for the relational engine that runs vetted statements.
///
/// Implementations are only ever handed statements that passed the
/// extraction and validation pipeline.
#[async_trait]
pub trait QueryExecutor: Send + Sync + Debug + DynClone {
    /// Returns the name of the engine (e.g., "SQLite").
    fn name(&self) -> &str;

    /// Executes a read query, returning one JSON object per row.
    async fn execute(&self, statement: &str) -> Result<Vec<Value>, QueryError>;
}

dyn_clone::clone_trait_object!(QueryExecutor);
