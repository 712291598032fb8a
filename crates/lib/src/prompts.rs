//! # Prompt Templates
//!
//! Default prompt templates and the assembly logic that turns registered
//! schemas, inferred relationships, and the user's question into the prompts
//! sent to the AI provider.

use crate::types::{RelationshipEdge, ResponseMode, TableSchema};
use std::collections::BTreeMap;
use std::fmt::Write;

/// The system prompt for the query generation task.
pub const QUERY_SYSTEM_PROMPT: &str = "You are a SQLite expert. Given any table schema and a natural language question, respond with the most accurate and efficient SQLite query. Always output SQLite-compliant SQL.";

/// Output instruction used in plain mode.
pub const PLAIN_OUTPUT_INSTRUCTION: &str =
    "Generate a SQL query to answer the question. Only return the SQL, no explanations or markdown formatting.";

/// Output instruction used in explain mode. The `Explanation:` and `SQL:`
/// headings are the markers the extraction pipeline splits on.
pub const EXPLAIN_OUTPUT_INSTRUCTION: &str =
    "Generate a SQL query to answer the question. First give a short reasoning under an 'Explanation:' heading, then the query under a 'SQL:' heading. No markdown formatting.";

/// Assembles the user prompt for query generation.
///
/// Emits one `Schema:` line per requested table in request order, a
/// `Relationships:` section when the inferrer proposed any join edges, the
/// question, and the mode's output instruction.
pub fn build_query_prompt(
    table_names: &[String],
    schemas: &BTreeMap<String, TableSchema>,
    relationships: &[RelationshipEdge],
    question: &str,
    mode: ResponseMode,
) -> String {
    let mut prompt = String::new();

    for name in table_names {
        let canonical = name.to_lowercase();
        let Some(schema) = schemas.get(&canonical) else {
            continue;
        };
        let columns = schema
            .columns
            .iter()
            .map(|c| format!("{}({})", c.name, c.column_type))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(prompt, "Schema: {canonical}({columns})");
    }

    if !relationships.is_empty() {
        let edges = relationships
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        let _ = writeln!(prompt, "Relationships: {edges}");
    }

    let _ = writeln!(prompt, "Question: {question}");
    let instruction = match mode {
        ResponseMode::Plain => PLAIN_OUTPUT_INSTRUCTION,
        ResponseMode::Explain => EXPLAIN_OUTPUT_INSTRUCTION,
    };
    let _ = writeln!(prompt, "{instruction}");
    if mode == ResponseMode::Plain {
        prompt.push_str("SQL: ");
    }

    prompt
}
