use thiserror::Error;

/// Custom error types for the library.
///
/// Expected, frequent outcomes (a cache miss, a table absent from a lookup)
/// are modelled as `Option`s at the call sites, not as variants here.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Invalid column definition: {0}")]
    InvalidDefinition(String),
    #[error("No SELECT statement could be recovered from the model response")]
    ExtractionEmpty,
    #[error("Generated statement is not a read query")]
    NotReadOnly,
    #[error("Generated statement contains blocked keyword: {0}")]
    BlockedKeyword(&'static str),
    #[error("Failed to persist schema snapshot: {0}")]
    StorageFailure(String),
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimension { expected: usize, actual: usize },
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Request to AI provider failed: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Query execution failed: {0}")]
    ExecutionFailed(String),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("An AI provider is required to build the client")]
    MissingAiProvider,
    #[error("A query executor is required to build the client")]
    MissingExecutor,
    #[error("An embedder is required to build the client")]
    MissingEmbedder,
}
