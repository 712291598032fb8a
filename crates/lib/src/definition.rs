//! # Column Definition Parsing
//!
//! Parses loose `name(type)` column lists such as
//! `id(int), name(text), age(int)` into typed column definitions for the
//! schema registry.

use crate::{
    errors::QueryError,
    types::{ColumnDef, ColumnType},
};
use regex::Regex;

/// Parses a comma-separated list of `name(type)` column definitions.
///
/// Column names must start with a letter or underscore; type tags map
/// case-insensitively onto [`ColumnType`], with unknown tags falling back to
/// text. Any malformed part, or an input with no definitions at all, is an
/// `InvalidDefinition` error.
pub fn parse_definition(definition: &str) -> Result<Vec<ColumnDef>, QueryError> {
    let part_re = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*([A-Za-z]+)\s*\)$")?;

    let mut columns = Vec::new();
    for part in definition.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let caps = part_re
            .captures(part)
            .ok_or_else(|| QueryError::InvalidDefinition(part.to_string()))?;
        columns.push(ColumnDef::new(&caps[1], ColumnType::from_tag(&caps[2])));
    }

    if columns.is_empty() {
        return Err(QueryError::InvalidDefinition(
            "no column definitions found".to_string(),
        ));
    }
    Ok(columns)
}
