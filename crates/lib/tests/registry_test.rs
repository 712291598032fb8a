//! # Schema Registry Tests
//!
//! Covers canonicalization, the synthetic identity column, snapshot
//! persistence, tolerance of corrupt snapshots, and rollback when the
//! snapshot store fails mid-mutation.

use nl2sql::{
    parse_definition, ColumnDef, ColumnType, FileSnapshotStore, MemorySnapshotStore, QueryError,
    SchemaRegistry, SnapshotStore,
};

fn memory_registry() -> SchemaRegistry {
    SchemaRegistry::load(Box::new(MemorySnapshotStore::new()))
}

/// Table names are canonicalized to lowercase for every operation.
#[test]
fn test_upsert_and_get_are_case_insensitive() -> anyhow::Result<()> {
    let registry = memory_registry();
    registry.upsert("Students", &parse_definition("name(text), age(int)")?)?;

    assert!(registry.exists("students"));
    assert!(registry.exists("STUDENTS"));
    let schema = registry.get("sTuDeNtS").unwrap();
    assert!(schema.has_column("name"));
    assert_eq!(registry.list().keys().collect::<Vec<_>>(), vec!["students"]);
    Ok(())
}

/// Every registered schema gets a synthetic integer `id` as its first
/// column, and a caller-supplied `id` column (any case) is ignored.
#[test]
fn test_synthetic_id_column_is_prepended() -> anyhow::Result<()> {
    let registry = memory_registry();
    let columns = vec![
        ColumnDef::new("ID", ColumnType::Text),
        ColumnDef::new("name", ColumnType::Text),
    ];
    let schema = registry.upsert("users", &columns)?;

    assert_eq!(schema.columns.len(), 2);
    assert_eq!(schema.columns[0], ColumnDef::new("id", ColumnType::Integer));
    assert_eq!(schema.columns[1].name, "name");
    Ok(())
}

/// Upserting an existing table fully replaces its schema.
#[test]
fn test_upsert_replaces_existing_schema() -> anyhow::Result<()> {
    let registry = memory_registry();
    registry.upsert("t", &parse_definition("a(text)")?)?;
    registry.upsert("t", &parse_definition("b(int), c(float)")?)?;

    let schema = registry.get("t").unwrap();
    assert!(!schema.has_column("a"));
    assert!(schema.has_column("b"));
    assert!(schema.has_column("c"));
    Ok(())
}

/// Removal reports whether an entry was actually dropped; removing an
/// absent table is a no-op, not an error.
#[test]
fn test_remove_reports_presence() -> anyhow::Result<()> {
    let registry = memory_registry();
    registry.upsert("events", &parse_definition("name(text)")?)?;

    assert!(registry.remove("Events")?);
    assert!(!registry.remove("events")?);
    assert!(!registry.exists("events"));
    Ok(())
}

/// A registry loaded from the snapshot of a previous instance sees the
/// same tables.
#[test]
fn test_snapshot_round_trip_across_instances() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("snapshot.json");

    let registry = SchemaRegistry::load(Box::new(FileSnapshotStore::new(&path)));
    registry.upsert("orders", &parse_definition("total(float), placed_at(datetime)")?)?;
    registry.upsert("customers", &parse_definition("name(text)")?)?;
    registry.remove("customers")?;

    let reloaded = SchemaRegistry::load(Box::new(FileSnapshotStore::new(&path)));
    assert!(reloaded.exists("orders"));
    assert!(!reloaded.exists("customers"));
    let schema = reloaded.get("orders").unwrap();
    assert_eq!(
        schema.column("total").map(|c| c.column_type),
        Some(ColumnType::Real)
    );
    Ok(())
}

/// A corrupt snapshot is tolerated by starting empty rather than failing
/// startup.
#[test]
fn test_malformed_snapshot_starts_empty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, "{ not json")?;

    let registry = SchemaRegistry::load(Box::new(FileSnapshotStore::new(&path)));
    assert!(registry.list().is_empty());

    // The registry remains usable and overwrites the bad snapshot.
    registry.upsert("t", &parse_definition("a(text)")?)?;
    let reloaded = SchemaRegistry::load(Box::new(FileSnapshotStore::new(&path)));
    assert!(reloaded.exists("t"));
    Ok(())
}

/// A snapshot store that accepts a fixed number of persists, then fails.
#[derive(Debug)]
struct FlakyStore {
    allowed: std::sync::atomic::AtomicUsize,
}

impl SnapshotStore for FlakyStore {
    fn load(&self) -> Result<Option<String>, QueryError> {
        Ok(None)
    }

    fn persist(&self, _snapshot: &str) -> Result<(), QueryError> {
        use std::sync::atomic::Ordering;
        if self.allowed.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            Ok(())
        } else {
            Err(QueryError::StorageFailure("disk full".into()))
        }
    }
}

/// A failed persist rolls the mutation back: in-memory state never
/// diverges from what was last persisted.
#[test]
fn test_persist_failure_rolls_back_mutation() -> anyhow::Result<()> {
    let registry = SchemaRegistry::load(Box::new(FlakyStore {
        allowed: std::sync::atomic::AtomicUsize::new(1),
    }));
    registry.upsert("t", &parse_definition("a(text)")?)?;

    let err = registry
        .upsert("t", &parse_definition("b(int)")?)
        .unwrap_err();
    assert!(matches!(err, QueryError::StorageFailure(_)));

    // The first schema is still in effect.
    let schema = registry.get("t").unwrap();
    assert!(schema.has_column("a"));
    assert!(!schema.has_column("b"));

    let err = registry.remove("t").unwrap_err();
    assert!(matches!(err, QueryError::StorageFailure(_)));
    assert!(registry.exists("t"));
    Ok(())
}
