//! # Shared Constants
//!
//! Centralized location for values shared across the library. Using these
//! constants avoids "magic strings" and keeps the extraction, validation,
//! and cache layers in agreement.

/// SQL keywords that immediately disqualify a generated statement.
///
/// Matched as whole words against the upper-cased, space-padded statement.
/// This is a string-matching defense layer, not a parser.
pub const BLOCKED_SQL_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "ALTER", "TRUNCATE", "CREATE", "INSERT",
];

/// Case-sensitive marker separating a model's explanation from its query.
pub const EXPLANATION_MARKER: &str = "Explanation:";

/// Case-sensitive marker introducing the query section of an explained response.
pub const SQL_MARKER: &str = "SQL:";

/// The character marking the end of one SQL statement within extracted text.
pub const STATEMENT_TERMINATOR: char = ';';

/// Minimum similarity score (`1 / (1 + distance)`) for a semantic cache hit.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.87;

/// How many nearest neighbors the semantic cache considers per lookup.
pub const DEFAULT_SEARCH_K: usize = 3;

/// Vector dimensionality of the default embedding model (all-MiniLM-L6-v2).
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Default path for the persisted schema registry snapshot.
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/schema_snapshot.json";

/// Default OpenAI-compatible chat completions endpoint.
pub const DEFAULT_COMPLETIONS_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for query generation.
pub const DEFAULT_COMPLETIONS_MODEL: &str = "mistralai/mistral-7b-instruct";
