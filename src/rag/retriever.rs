use std::sync::Arc;

use super::repository::ExampleRepository;
use crate::core::errors::ApiError;

/// Maps a prompt to the stored website whose `input` is most similar.
#[derive(Clone)]
pub struct Retriever {
    repository: Arc<dyn ExampleRepository>,
}

impl Retriever {
    pub fn new(repository: Arc<dyn ExampleRepository>) -> Self {
        Self { repository }
    }

    /// Read-only. Only the top-1 neighbour is considered.
    pub async fn retrieve(&self, query: &str) -> Result<String, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::BadRequest("query must not be empty".to_string()));
        }

        let neighbor = self.repository.nearest(query).await?.ok_or_else(|| {
            ApiError::NotFound("no similar example found; is the collection ingested?".to_string())
        })?;

        tracing::debug!(
            doc_id = %neighbor.doc_id,
            distance = neighbor.distance,
            "Nearest example"
        );

        self.repository.resolve(&neighbor).ok_or_else(|| {
            tracing::warn!(
                doc_id = %neighbor.doc_id,
                "Indexed document has no matching row in the example store"
            );
            ApiError::NotFound(format!(
                "example {} is indexed but missing from the example store",
                neighbor.doc_id
            ))
        })
    }
}
