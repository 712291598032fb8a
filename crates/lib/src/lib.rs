//! # Natural Language to SQL
//!
//! This crate converts natural language questions into vetted, read-only SQL
//! statements against dynamically-defined tables and executes them through a
//! configurable storage backend. It provides:
//!
//! - a persistent [`registry::SchemaRegistry`] of logical table schemas,
//! - a heuristic [`relationships`] inferrer that proposes join edges for
//!   multi-table questions,
//! - an [`extract`] pipeline that recovers exactly one validated `SELECT`
//!   statement from free-form model output, and
//! - a [`cache::SemanticCache`] that serves semantically similar questions
//!   without repeating the model call.

pub mod cache;
pub mod constants;
pub mod definition;
pub mod errors;
pub mod extract;
pub mod prompts;
pub mod providers;
pub mod registry;
pub mod relationships;
pub mod types;

pub use cache::SemanticCache;
pub use definition::parse_definition;
pub use errors::QueryError;
pub use extract::extract_and_validate;
pub use registry::{FileSnapshotStore, MemorySnapshotStore, SchemaRegistry, SnapshotStore};
pub use relationships::infer_relationships;
pub use types::{
    CacheEntry, ColumnDef, ColumnType, ExtractionResult, QueryOutcome, RelationshipEdge,
    ResponseMode, TableSchema,
};

use providers::{
    ai::{AiProvider, Embedder},
    db::QueryExecutor,
};
use std::{collections::BTreeMap, fmt, sync::Arc};
use tracing::{debug, error, info};

/// A client that answers natural-language questions over registered tables.
///
/// Owned by the process's composition root and shared by reference across
/// request handlers; all contained state is safe for concurrent use.
pub struct QueryClient {
    ai_provider: Box<dyn AiProvider>,
    executor: Box<dyn QueryExecutor>,
    registry: Arc<SchemaRegistry>,
    cache: Arc<SemanticCache>,
    similarity_threshold: f32,
    search_k: usize,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("executor", &self.executor.name())
            .field("similarity_threshold", &self.similarity_threshold)
            .field("search_k", &self.search_k)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// The schema registry backing this client.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// The semantic answer cache backing this client.
    pub fn cache(&self) -> &Arc<SemanticCache> {
        &self.cache
    }

    /// Answers a natural-language question over one or more registered tables.
    ///
    /// Flow: resolve each table's schema (failing with `TableNotFound` for
    /// any absent table), infer join relationships, consult the semantic
    /// cache, and on a miss assemble the prompt, call the model, run the
    /// extraction and validation pipeline, execute the vetted statement, and
    /// populate the cache with the result.
    pub async fn answer(
        &self,
        table_names: &[String],
        question: &str,
        mode: ResponseMode,
    ) -> Result<QueryOutcome, QueryError> {
        info!(tables = ?table_names, %mode, "[answer] received question: {question:?}");

        let mut schemas = BTreeMap::new();
        for name in table_names {
            let canonical = name.to_lowercase();
            let schema = self
                .registry
                .get(&canonical)
                .ok_or_else(|| QueryError::TableNotFound(name.clone()))?;
            schemas.insert(canonical, schema);
        }

        let edges = infer_relationships(table_names, &schemas);

        if let Some(entry) = self
            .cache
            .search(question, mode, self.similarity_threshold, self.search_k)
            .await?
        {
            info!("[answer] Semantic cache hit; skipping model call.");
            return Ok(QueryOutcome {
                statement: entry.statement,
                rows: entry.rows,
                explanation: entry.explanation,
                cached: true,
            });
        }

        let user_prompt = prompts::build_query_prompt(table_names, &schemas, &edges, question, mode);
        debug!(system_prompt = %prompts::QUERY_SYSTEM_PROMPT, user_prompt = %user_prompt, "--> Sending prompts to AI provider");

        let raw_response = self
            .ai_provider
            .generate(prompts::QUERY_SYSTEM_PROMPT, &user_prompt)
            .await?;
        debug!("<-- Raw response from AI: {raw_response}");

        let extraction = extract::extract_and_validate(&raw_response, mode)?;

        let rows = self.executor.execute(&extraction.statement).await;
        if let Err(e) = &rows {
            error!("[answer] Query execution error: {e:?}");
        }
        let rows = rows?;

        self.cache
            .add(
                question,
                &extraction.statement,
                rows.clone(),
                extraction.explanation.clone(),
                mode,
            )
            .await?;

        Ok(QueryOutcome {
            statement: extraction.statement,
            rows,
            explanation: extraction.explanation,
            cached: false,
        })
    }
}

/// A builder for creating [`QueryClient`] instances.
///
/// The AI provider, query executor, and either a pre-built cache or an
/// embedder are required; the registry defaults to a file-backed one at
/// [`constants::DEFAULT_SNAPSHOT_PATH`].
#[derive(Default)]
pub struct QueryClientBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    executor: Option<Box<dyn QueryExecutor>>,
    embedder: Option<Box<dyn Embedder>>,
    registry: Option<Arc<SchemaRegistry>>,
    cache: Option<Arc<SemanticCache>>,
    embedding_dimension: Option<usize>,
    similarity_threshold: Option<f32>,
    search_k: Option<usize>,
}

impl QueryClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ai_provider(mut self, provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    pub fn executor(mut self, executor: Box<dyn QueryExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the embedder used to build the semantic cache. Ignored when a
    /// pre-built cache is supplied.
    pub fn embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn cache(mut self, cache: Arc<SemanticCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn embedding_dimension(mut self, dimension: usize) -> Self {
        self.embedding_dimension = Some(dimension);
        self
    }

    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn search_k(mut self, k: usize) -> Self {
        self.search_k = Some(k);
        self
    }

    /// Builds the `QueryClient`, failing with a typed error when a required
    /// collaborator is missing.
    pub fn build(self) -> Result<QueryClient, QueryError> {
        let ai_provider = self.ai_provider.ok_or(QueryError::MissingAiProvider)?;
        let executor = self.executor.ok_or(QueryError::MissingExecutor)?;

        let cache = match self.cache {
            Some(cache) => cache,
            None => {
                let embedder = self.embedder.ok_or(QueryError::MissingEmbedder)?;
                let dimension = self
                    .embedding_dimension
                    .unwrap_or(constants::DEFAULT_EMBEDDING_DIMENSION);
                Arc::new(SemanticCache::new(embedder, dimension))
            }
        };

        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(SchemaRegistry::load(Box::new(FileSnapshotStore::new(
                constants::DEFAULT_SNAPSHOT_PATH,
            )))),
        };

        Ok(QueryClient {
            ai_provider,
            executor,
            registry,
            cache,
            similarity_threshold: self
                .similarity_threshold
                .unwrap_or(constants::DEFAULT_SIMILARITY_THRESHOLD),
            search_k: self.search_k.unwrap_or(constants::DEFAULT_SEARCH_K),
        })
    }
}
