//! # Semantic Answer Cache
//!
//! Avoids redundant model calls by matching new questions to semantically
//! similar previously-answered ones. Questions are keyed by an embedding of
//! their mode-augmented text, so explain-mode and plain-mode answers never
//! cross-match even for identical question text.
//!
//! The similarity index (vectors) and the answer store (entries) are
//! parallel, index-aligned, append-only collections guarded by one lock.
//! Entries are immutable once added; there is no eviction.

use crate::{
    errors::QueryError,
    providers::ai::Embedder,
    types::{CacheEntry, ResponseMode},
};
use serde_json::Value;
use std::{cmp::Ordering, fmt, sync::Mutex};
use tracing::debug;

#[derive(Default)]
struct CacheInner {
    vectors: Vec<Vec<f32>>,
    entries: Vec<CacheEntry>,
}

/// An in-process cache of previously validated (question, statement, rows,
/// explanation) tuples, indexed by approximate vector similarity.
pub struct SemanticCache {
    embedder: Box<dyn Embedder>,
    dimension: usize,
    inner: Mutex<CacheInner>,
}

impl fmt::Debug for SemanticCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticCache")
            .field("dimension", &self.dimension)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl SemanticCache {
    /// Creates an empty cache bound to an embedder and a fixed vector
    /// dimensionality.
    pub fn new(embedder: Box<dyn Embedder>, dimension: usize) -> Self {
        Self {
            embedder,
            dimension,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn embed_keyed(
        &self,
        question: &str,
        mode: ResponseMode,
    ) -> Result<Vec<f32>, QueryError> {
        let augmented = format!("{} {question}", mode.marker());
        let vector = self.embedder.embed(&augmented).await?;
        if vector.len() != self.dimension {
            return Err(QueryError::EmbeddingDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Appends a validated answer, keyed by an embedding of the
    /// mode-augmented question. The vector and the entry are appended as one
    /// unit under the lock, keeping index and store length-aligned.
    pub async fn add(
        &self,
        question: &str,
        statement: &str,
        rows: Vec<Value>,
        explanation: Option<String>,
        mode: ResponseMode,
    ) -> Result<(), QueryError> {
        let vector = self.embed_keyed(question, mode).await?;
        let mut inner = self.inner.lock().unwrap();
        inner.vectors.push(vector);
        inner.entries.push(CacheEntry {
            question: question.to_string(),
            mode,
            statement: statement.to_string(),
            rows,
            explanation,
        });
        debug!(size = inner.entries.len(), %mode, "Cached answer");
        Ok(())
    }

    /// Looks up the closest previously-answered question.
    ///
    /// The `k` nearest stored vectors are considered in ascending-distance
    /// order; the first whose stored mode matches and whose similarity
    /// `1 / (1 + distance)` is at or above `threshold` is returned. An empty
    /// cache, or no qualifying candidate, is a miss — a normal outcome, not
    /// an error.
    pub async fn search(
        &self,
        question: &str,
        mode: ResponseMode,
        threshold: f32,
        k: usize,
    ) -> Result<Option<CacheEntry>, QueryError> {
        if self.is_empty() {
            return Ok(None);
        }
        let vector = self.embed_keyed(question, mode).await?;

        let inner = self.inner.lock().unwrap();
        let mut ranked: Vec<(usize, f32)> = inner
            .vectors
            .iter()
            .enumerate()
            .map(|(i, stored)| (i, squared_l2_distance(&vector, stored)))
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        for (index, distance) in ranked.into_iter().take(k) {
            let entry = &inner.entries[index];
            if entry.mode != mode {
                continue;
            }
            let similarity = 1.0 / (1.0 + distance);
            if similarity >= threshold {
                debug!(distance, similarity, "Semantic cache hit");
                return Ok(Some(entry.clone()));
            }
        }
        debug!("Semantic cache miss");
        Ok(None)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}
