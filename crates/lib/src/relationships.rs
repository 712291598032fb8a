//! # Relationship Inferrer
//!
//! A heuristic that proposes join relationships between the tables named in
//! a request, used to enrich the query-generation prompt for multi-table
//! questions. A column `college_id` on `students` is assumed to point at the
//! `id` column of a table named `colleges` (strip `_id`, append `s` — no
//! irregular-plural handling). This is a hint for the model, not a foreign
//! key guarantee: it never fails and never requires a match to exist.

use crate::types::{RelationshipEdge, TableSchema};
use std::collections::BTreeMap;

const FOREIGN_KEY_SUFFIX: &str = "_id";
const IDENTITY_COLUMN: &str = "id";

/// Proposes join edges between the requested tables.
///
/// Emission order follows the request's table order, then column declaration
/// order within each table. Duplicate edges are kept verbatim. Tables absent
/// from `schemas` are silently skipped.
pub fn infer_relationships(
    table_names: &[String],
    schemas: &BTreeMap<String, TableSchema>,
) -> Vec<RelationshipEdge> {
    let mut edges = Vec::new();

    for source in table_names {
        let source_key = source.to_lowercase();
        let Some(schema) = schemas.get(&source_key) else {
            continue;
        };
        for column in &schema.columns {
            let Some(prefix) = column.name.strip_suffix(FOREIGN_KEY_SUFFIX) else {
                continue;
            };
            let candidate = format!("{prefix}s");
            for target in table_names {
                let target_key = target.to_lowercase();
                if target_key == source_key {
                    continue;
                }
                let Some(target_schema) = schemas.get(&target_key) else {
                    continue;
                };
                if !target_schema.has_column(IDENTITY_COLUMN) {
                    continue;
                }
                if target_key.eq_ignore_ascii_case(&candidate) {
                    edges.push(RelationshipEdge {
                        source_table: source_key.clone(),
                        source_column: column.name.clone(),
                        target_table: target_key,
                        target_column: IDENTITY_COLUMN.to_string(),
                    });
                }
            }
        }
    }

    edges
}
