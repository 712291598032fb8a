//! # Schema Registry
//!
//! Tracks which logical tables exist and their column layouts, persisted
//! across restarts. The registry manages metadata only; column storage and
//! constraint enforcement belong to the query executor.
//!
//! Every mutation rewrites the full snapshot to the injected [`SnapshotStore`]
//! before the in-memory mapping is swapped, so a completed call is never lost
//! and a failed persist never leaves memory diverged from persisted truth.

use crate::{
    errors::QueryError,
    types::{ColumnDef, ColumnType, TableSchema},
};
use chrono::Utc;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::PathBuf,
    sync::{Mutex, RwLock},
};
use tracing::{info, warn};

/// Durable storage for the serialized registry snapshot.
///
/// A single named resource: read once at startup, rewritten whole on every
/// mutation.
pub trait SnapshotStore: Send + Sync + Debug {
    /// Reads the persisted snapshot, or `None` if nothing was ever persisted.
    fn load(&self) -> Result<Option<String>, QueryError>;

    /// Replaces the persisted snapshot. Must never leave a partially written
    /// snapshot observable to a future `load`.
    fn persist(&self, snapshot: &str) -> Result<(), QueryError>;
}

/// File-backed snapshot store using write-new-then-rename discipline.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<String>, QueryError> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| QueryError::StorageFailure(e.to_string()))
    }

    fn persist(&self, snapshot: &str) -> Result<(), QueryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| QueryError::StorageFailure(e.to_string()))?;
            }
        }
        // Write to a sibling temp file first so a crash mid-write leaves the
        // previous snapshot intact, then swap it in atomically.
        let mut tmp_path = self.path.clone();
        tmp_path.as_mut_os_string().push(".tmp");
        fs::write(&tmp_path, snapshot).map_err(|e| QueryError::StorageFailure(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| QueryError::StorageFailure(e.to_string()))
    }
}

/// In-memory snapshot store for tests and ephemeral registries.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<String>, QueryError> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn persist(&self, snapshot: &str) -> Result<(), QueryError> {
        *self.inner.lock().unwrap() = Some(snapshot.to_string());
        Ok(())
    }
}

/// The in-process registry of logical table schemas.
///
/// Mutations are linearized under one exclusive critical section covering
/// compute, persist, and swap. Reads observe only full snapshots.
#[derive(Debug)]
pub struct SchemaRegistry {
    tables: RwLock<BTreeMap<String, TableSchema>>,
    store: Box<dyn SnapshotStore>,
}

impl SchemaRegistry {
    /// Loads the registry from the persisted snapshot.
    ///
    /// A missing or malformed snapshot is never fatal: it is logged and the
    /// registry starts empty.
    pub fn load(store: Box<dyn SnapshotStore>) -> Self {
        let tables = match store.load() {
            Ok(Some(snapshot)) => match serde_json::from_str(&snapshot) {
                Ok(tables) => tables,
                Err(e) => {
                    warn!("Invalid schema snapshot, starting with empty registry: {e}");
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read schema snapshot, starting with empty registry: {e}");
                BTreeMap::new()
            }
        };
        info!("Schema registry loaded with {} tables", tables.len());
        Self {
            tables: RwLock::new(tables),
            store,
        }
    }

    /// Returns true iff a canonicalized entry is present.
    pub fn exists(&self, name: &str) -> bool {
        self.tables
            .read()
            .unwrap()
            .contains_key(&name.to_lowercase())
    }

    /// Returns the schema for a table, if registered.
    pub fn get(&self, name: &str) -> Option<TableSchema> {
        self.tables.read().unwrap().get(&name.to_lowercase()).cloned()
    }

    /// Returns a consistent snapshot of all registered schemas.
    pub fn list(&self) -> BTreeMap<String, TableSchema> {
        self.tables.read().unwrap().clone()
    }

    /// Creates or fully replaces the schema for a table.
    ///
    /// The synthetic `id` identity column is always prepended; a caller
    /// column named `id` (any case) is skipped. The new snapshot is persisted
    /// before the in-memory state is swapped, so a persist failure rolls the
    /// call back entirely.
    pub fn upsert(&self, name: &str, columns: &[ColumnDef]) -> Result<TableSchema, QueryError> {
        let canonical = name.to_lowercase();

        let mut schema_columns = vec![ColumnDef::new("id", ColumnType::Integer)];
        for column in columns {
            if column.name.eq_ignore_ascii_case("id") {
                continue;
            }
            schema_columns.push(column.clone());
        }
        let schema = TableSchema {
            columns: schema_columns,
            created_at: Utc::now(),
        };

        let mut guard = self.tables.write().unwrap();
        let mut next = guard.clone();
        next.insert(canonical.clone(), schema.clone());
        self.persist(&next)?;
        *guard = next;

        info!(
            table = %canonical,
            columns = schema.columns.len(),
            "Registered table schema"
        );
        Ok(schema)
    }

    /// Removes a table's entry, reporting whether anything was removed.
    ///
    /// Removing an absent table is not an error.
    pub fn remove(&self, name: &str) -> Result<bool, QueryError> {
        let canonical = name.to_lowercase();

        let mut guard = self.tables.write().unwrap();
        if !guard.contains_key(&canonical) {
            return Ok(false);
        }
        let mut next = guard.clone();
        next.remove(&canonical);
        self.persist(&next)?;
        *guard = next;

        info!(table = %canonical, "Removed table schema");
        Ok(true)
    }

    fn persist(&self, tables: &BTreeMap<String, TableSchema>) -> Result<(), QueryError> {
        let snapshot = serde_json::to_string_pretty(tables)?;
        self.store.persist(&snapshot)
    }
}
