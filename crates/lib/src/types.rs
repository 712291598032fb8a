use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The fixed set of declared column types a table definition may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Date,
    DateTime,
}

impl ColumnType {
    /// Maps a caller-supplied type tag to a `ColumnType`.
    ///
    /// Unknown tags fall back to `Text`, matching the permissive behavior
    /// callers rely on when defining tables from loose input.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "int" | "integer" => Self::Integer,
            "float" | "real" => Self::Real,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Real => "real",
            Self::Date => "date",
            Self::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named, typed column within a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// The registered layout of one logical table.
///
/// Columns are kept in declaration order. The synthetic `id` identity column
/// is always the first entry and is inserted by the registry, never by the
/// caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
    pub created_at: DateTime<Utc>,
}

impl TableSchema {
    /// Looks up a column by its exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// The response style requested by the caller.
///
/// The two modes partition the semantic cache: identical question text asked
/// in different modes never cross-matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Plain,
    Explain,
}

impl ResponseMode {
    /// The marker prepended to question text before embedding, so the two
    /// modes occupy disjoint regions of the vector space.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Plain => "[plain]",
            Self::Explain => "[explain]",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Explain => f.write_str("explain"),
        }
    }
}

/// A heuristic join relationship between two requested tables.
///
/// Derived fresh per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipEdge {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

impl fmt::Display for RelationshipEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.source_table, self.source_column, self.target_table, self.target_column
        )
    }
}

/// The result of splitting and extracting a raw model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Explanation text, present only when the caller requested it and the
    /// response carried one.
    pub explanation: Option<String>,
    /// Exactly one validated SQL statement, original casing preserved.
    pub statement: String,
}

/// One immutable, append-only semantic cache record.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub question: String,
    pub mode: ResponseMode,
    pub statement: String,
    /// Result rows, round-tripped verbatim as JSON objects.
    pub rows: Vec<Value>,
    pub explanation: Option<String>,
}

/// The answer to one natural-language query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub statement: String,
    pub rows: Vec<Value>,
    pub explanation: Option<String>,
    /// True when the answer was served from the semantic cache.
    pub cached: bool,
}
