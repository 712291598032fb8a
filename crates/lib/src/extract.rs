//! # Response Extraction & Validation Pipeline
//!
//! Turns free-form, occasionally malformed model output into exactly one
//! vetted, read-only SQL statement. The pipeline is two sequential stages
//! over the raw text — split explanation from statement, then recover one
//! statement — followed by a validation pass.
//!
//! Validation is a string-matching defense layer, not a parser. It accepts
//! the risk of a statement smuggling a keyword inside a string literal; that
//! is a documented limitation.

use crate::{
    constants::{BLOCKED_SQL_KEYWORDS, EXPLANATION_MARKER, SQL_MARKER, STATEMENT_TERMINATOR},
    errors::QueryError,
    types::{ExtractionResult, ResponseMode},
};
use std::collections::VecDeque;
use tracing::debug;

const FENCE_TOKEN: &str = "```";
const LINE_COMMENT: &str = "--";
const READ_PREFIX: &str = "SELECT";

/// Stage A: splits an optional explanation from the statement candidate.
///
/// With no `Explanation:` marker the whole text is the candidate. In plain
/// mode, text before the marker is discarded as a stray prefix and the tail
/// becomes the candidate. In explain mode, the explanation is the text
/// between `Explanation:` and a following `SQL:` marker (the candidate is
/// what follows `SQL:`), or the whole tail when no `SQL:` marker follows
/// (the candidate is then the text before `Explanation:`).
pub fn split_explanation(raw: &str, mode: ResponseMode) -> (Option<String>, String) {
    let Some(pos) = raw.find(EXPLANATION_MARKER) else {
        return (None, raw.to_string());
    };
    let head = &raw[..pos];
    let tail = &raw[pos + EXPLANATION_MARKER.len()..];

    match mode {
        ResponseMode::Plain => (None, tail.to_string()),
        ResponseMode::Explain => match tail.find(SQL_MARKER) {
            Some(sql_pos) => {
                let explanation = tail[..sql_pos].trim();
                let candidate = tail[sql_pos + SQL_MARKER.len()..].to_string();
                (non_empty(explanation), candidate)
            }
            None => (non_empty(tail.trim()), head.to_string()),
        },
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Stage B: recovers exactly one statement from the candidate text.
///
/// Strips surrounding code fences and `--` line comments, then collects
/// lines starting from the first one that begins with `SELECT`
/// (case-insensitive) up to and including the first statement terminator.
/// The terminating line is truncated just past the terminator, so trailing
/// clauses on the same line are dropped. If no terminator is ever seen, one
/// is appended; if no line starts with `SELECT`, the result is empty.
pub fn extract_statement(candidate: &str) -> String {
    let mut lines: VecDeque<&str> = candidate.lines().collect();

    while matches!(lines.front(), Some(l) if l.trim().is_empty()) {
        lines.pop_front();
    }
    if matches!(lines.front(), Some(l) if l.trim().starts_with(FENCE_TOKEN)) {
        lines.pop_front();
    }
    while matches!(lines.back(), Some(l) if l.trim().is_empty()) {
        lines.pop_back();
    }
    if matches!(lines.back(), Some(l) if l.trim().starts_with(FENCE_TOKEN)) {
        lines.pop_back();
    }

    let mut collected: Vec<&str> = Vec::new();
    let mut terminated = false;
    for line in lines {
        let line = match line.find(LINE_COMMENT) {
            Some(i) => &line[..i],
            None => line,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if collected.is_empty() && !trimmed.to_uppercase().starts_with(READ_PREFIX) {
            continue;
        }
        match trimmed.find(STATEMENT_TERMINATOR) {
            Some(i) => {
                collected.push(&trimmed[..=i]);
                terminated = true;
                break;
            }
            None => collected.push(trimmed),
        }
    }

    if collected.is_empty() {
        return String::new();
    }
    let mut statement = collected.join(" ");
    if !terminated {
        statement.push(STATEMENT_TERMINATOR);
    }
    statement
}

/// Rejects anything but a single non-mutating query.
///
/// An empty statement means nothing was recoverable; a non-`SELECT` prefix
/// means the model produced something other than a read query; a whole-word
/// blocklist hit names the offending keyword. Accepted statements are
/// returned to the caller unmodified, original casing preserved.
pub fn validate_statement(statement: &str) -> Result<(), QueryError> {
    let trimmed = statement.trim();
    if trimmed.is_empty() {
        return Err(QueryError::ExtractionEmpty);
    }
    if !trimmed.to_uppercase().starts_with(READ_PREFIX) {
        return Err(QueryError::NotReadOnly);
    }
    let padded = format!(" {} ", trimmed.to_uppercase());
    for keyword in BLOCKED_SQL_KEYWORDS.iter().copied() {
        if padded.contains(&format!(" {keyword} ")) {
            debug!(keyword, "Blocked generated statement");
            return Err(QueryError::BlockedKeyword(keyword));
        }
    }
    Ok(())
}

/// Runs the full pipeline over a raw model response.
pub fn extract_and_validate(
    raw: &str,
    mode: ResponseMode,
) -> Result<ExtractionResult, QueryError> {
    let (explanation, candidate) = split_explanation(raw, mode);
    let statement = extract_statement(&candidate);
    validate_statement(&statement)?;
    debug!(statement = %statement, "Extracted statement from model response");
    Ok(ExtractionResult {
        explanation,
        statement,
    })
}
