//! Embeddings provider backed by an external, OpenAI-compatible API.

use crate::{errors::QueryError, providers::ai::Embedder};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize, Debug)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// An [`Embedder`] that calls an OpenAI-compatible embeddings endpoint.
#[derive(Clone, Debug)]
pub struct ApiEmbedder {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl ApiEmbedder {
    /// Creates a new `ApiEmbedder`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
    ) -> Result<Self, QueryError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(QueryError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, QueryError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input,
        };
        debug!(model = %self.model, "--> Sending embeddings request");

        let mut request_builder = self.client.post(&self.api_url).json(&request_body);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder.send().await.map_err(QueryError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(QueryError::AiApi(error_text));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(QueryError::AiDeserialization)?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| QueryError::AiApi("Embeddings API returned no embeddings".to_string()))
    }
}
