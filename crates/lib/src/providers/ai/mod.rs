pub mod embedding;
pub mod open_router;

use crate::errors::QueryError;
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use embedding::ApiEmbedder;
pub use open_router::OpenRouterProvider;
use std::fmt::Debug;

/// A trait for interacting with an AI provider.
///
/// This defines a common interface for generating SQL from natural language
/// using different language model backends.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    ///
    /// The result is the model's raw text answer; extraction and validation
    /// happen downstream.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, QueryError>;
}

dyn_clone::clone_trait_object!(AiProvider);

/// A trait for computing text embeddings.
///
/// Assumed deterministic for identical input, with a dimensionality fixed at
/// cache construction.
#[async_trait]
pub trait Embedder: Send + Sync + Debug + DynClone {
    /// Returns a fixed-length numeric vector for the input text.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, QueryError>;
}

dyn_clone::clone_trait_object!(Embedder);
