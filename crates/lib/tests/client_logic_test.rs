//! # Query Client Tests
//!
//! Exercises the full answer flow against an in-memory SQLite database with
//! a scripted AI provider: prompt assembly, extraction, execution, cache
//! population, and the builder's required-collaborator checks.

use async_trait::async_trait;
use nl2sql::providers::ai::{AiProvider, Embedder};
use nl2sql::providers::db::SqliteExecutor;
use nl2sql::{
    parse_definition, MemorySnapshotStore, QueryClient, QueryClientBuilder, QueryError,
    ResponseMode, SchemaRegistry,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Returns a canned response and records every prompt it was sent.
#[derive(Debug, Clone)]
struct ScriptedProvider {
    response: String,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    async fn generate(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Deterministic toy embedding: identical text always maps to the same
/// vector, which is all the cache tests here need.
#[derive(Debug, Clone)]
struct ByteSumEmbedder;

#[async_trait]
impl Embedder for ByteSumEmbedder {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, QueryError> {
        let mut vector = vec![0.0f32; 4];
        for (i, byte) in input.bytes().enumerate() {
            vector[i % 4] += byte as f32;
        }
        Ok(vector)
    }
}

async fn seeded_executor() -> anyhow::Result<SqliteExecutor> {
    let executor = SqliteExecutor::new(":memory:").await?;
    executor
        .batch_execute(
            "CREATE TABLE students (id INTEGER PRIMARY KEY, name TEXT, age INTEGER);
             INSERT INTO students (id, name, age) VALUES (1, 'Ada', 36);
             INSERT INTO students (id, name, age) VALUES (2, 'Alan', 41)",
        )
        .await?;
    Ok(executor)
}

async fn client_with(provider: ScriptedProvider) -> anyhow::Result<QueryClient> {
    let registry = Arc::new(SchemaRegistry::load(Box::new(MemorySnapshotStore::new())));
    registry.upsert("students", &parse_definition("name(text), age(int)")?)?;

    let client = QueryClientBuilder::new()
        .ai_provider(Box::new(provider))
        .executor(Box::new(seeded_executor().await?))
        .embedder(Box::new(ByteSumEmbedder))
        .embedding_dimension(4)
        .registry(registry)
        .build()?;
    Ok(client)
}

/// First ask goes through the model and executor; an identical repeat is
/// served from the semantic cache without a second model call.
#[tokio::test]
async fn test_answer_flow_and_cache_population() -> anyhow::Result<()> {
    let provider =
        ScriptedProvider::new("```sql\nSELECT name FROM students WHERE age > 40;\n```");
    let calls = provider.calls.clone();
    let prompts = provider.prompts.clone();
    let client = client_with(provider).await?;
    let tables = vec!["students".to_string()];

    let outcome = client
        .answer(&tables, "Who is over 40?", ResponseMode::Plain)
        .await?;
    assert!(!outcome.cached);
    assert_eq!(outcome.statement, "SELECT name FROM students WHERE age > 40;");
    assert_eq!(outcome.rows, vec![json!({"name": "Alan"})]);
    assert_eq!(outcome.explanation, None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let sent = prompts.lock().unwrap()[0].clone();
    assert!(sent.contains("Schema: students(id(integer), name(text), age(integer))"));
    assert!(sent.contains("Question: Who is over 40?"));

    let repeat = client
        .answer(&tables, "Who is over 40?", ResponseMode::Plain)
        .await?;
    assert!(repeat.cached);
    assert_eq!(repeat.rows, vec![json!({"name": "Alan"})]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

/// Explain mode carries the model's explanation through to the outcome.
#[tokio::test]
async fn test_explain_mode_returns_explanation() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(
        "Explanation:\nFilters students older than forty.\nSQL:\nSELECT name FROM students WHERE age > 40;",
    );
    let client = client_with(provider).await?;

    let outcome = client
        .answer(
            &["students".to_string()],
            "Who is over 40?",
            ResponseMode::Explain,
        )
        .await?;
    assert_eq!(
        outcome.explanation.as_deref(),
        Some("Filters students older than forty.")
    );
    assert_eq!(outcome.rows, vec![json!({"name": "Alan"})]);
    Ok(())
}

/// A smuggled second clause after the terminator never reaches the
/// executor; the table survives and the truncated read runs.
#[tokio::test]
async fn test_trailing_mutation_is_truncated_before_execution() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new("SELECT * FROM students; DROP TABLE students;");
    let client = client_with(provider).await?;

    let outcome = client
        .answer(&["students".to_string()], "Show everything", ResponseMode::Plain)
        .await?;
    assert_eq!(outcome.statement, "SELECT * FROM students;");
    assert_eq!(outcome.rows.len(), 2);
    Ok(())
}

/// A response with no recoverable SELECT fails before execution.
#[tokio::test]
async fn test_mutation_only_response_is_rejected() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new("DELETE FROM students;");
    let calls = provider.calls.clone();
    let client = client_with(provider).await?;

    let err = client
        .answer(&["students".to_string()], "Clear the table", ResponseMode::Plain)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::ExtractionEmpty));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(client.cache().is_empty());
    Ok(())
}

/// Asking over an unregistered table fails up front, before any model call.
#[tokio::test]
async fn test_unknown_table_is_rejected() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new("SELECT 1;");
    let calls = provider.calls.clone();
    let client = client_with(provider).await?;

    let err = client
        .answer(&["missing".to_string()], "anything", ResponseMode::Plain)
        .await
        .unwrap_err();
    match err {
        QueryError::TableNotFound(name) => assert_eq!(name, "missing"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

/// The builder names the missing collaborator.
#[tokio::test]
async fn test_builder_requires_collaborators() -> anyhow::Result<()> {
    let err = QueryClientBuilder::new().build().unwrap_err();
    assert!(matches!(err, QueryError::MissingAiProvider));

    let err = QueryClientBuilder::new()
        .ai_provider(Box::new(ScriptedProvider::new("SELECT 1;")))
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::MissingExecutor));

    let err = QueryClientBuilder::new()
        .ai_provider(Box::new(ScriptedProvider::new("SELECT 1;")))
        .executor(Box::new(SqliteExecutor::new(":memory:").await?))
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::MissingEmbedder));
    Ok(())
}
