//! VectorIndex trait: the similarity index seam.
//!
//! The index owns `(doc_id, document, embedding)` triples and answers
//! nearest-neighbour queries. How it searches is its own business; callers
//! only rely on results being ordered by ascending distance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A document as stored in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub doc_id: String,
    /// The text that was embedded.
    pub document: String,
}

/// One query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub doc_id: String,
    pub document: String,
    /// Cosine distance (`1 - cosine similarity`), lower = closer.
    pub distance: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace documents by id.
    async fn upsert_batch(
        &self,
        items: Vec<(IndexedDocument, Vec<f32>)>,
    ) -> Result<(), ApiError>;

    /// Closest `top_k` documents to the query embedding, nearest first.
    async fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<Neighbor>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError>;

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError>;
}
