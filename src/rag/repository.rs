use std::sync::Arc;

use async_trait::async_trait;

use super::examples::ExampleStore;
use super::store::{Neighbor, VectorIndex};
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

/// One logical view over the vector collection and the example table.
#[async_trait]
pub trait ExampleRepository: Send + Sync {
    /// Single closest indexed document for `query`, if the collection has any.
    async fn nearest(&self, query: &str) -> Result<Option<Neighbor>, ApiError>;

    /// Output paired with a document id.
    fn lookup_by_id(&self, id: &str) -> Option<String>;

    /// Output paired with an exact `input` text.
    fn lookup_by_input(&self, input: &str) -> Option<String>;

    /// Resolves a hit to its output: by id first, then by the restored
    /// document text. `None` means the index and the table disagree.
    fn resolve(&self, neighbor: &Neighbor) -> Option<String> {
        self.lookup_by_id(&neighbor.doc_id)
            .filter(|_| self.id_matches_document(neighbor))
            .or_else(|| self.lookup_by_input(&neighbor.document))
    }

    /// Whether the id's `input` is the text the index returned. Implementations
    /// without the table at hand may keep the default.
    fn id_matches_document(&self, _neighbor: &Neighbor) -> bool {
        true
    }
}

/// Vector index + embedder + example table.
#[derive(Clone)]
pub struct IndexedExamples {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn LlmProvider>,
    examples: Arc<ExampleStore>,
}

impl IndexedExamples {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn LlmProvider>,
        examples: Arc<ExampleStore>,
    ) -> Self {
        Self {
            index,
            embedder,
            examples,
        }
    }
}

#[async_trait]
impl ExampleRepository for IndexedExamples {
    async fn nearest(&self, query: &str) -> Result<Option<Neighbor>, ApiError> {
        let embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::malformed("embedding provider returned no vector"))?;

        let hits = self.index.query(&embedding, 1).await?;
        Ok(hits.into_iter().next())
    }

    fn lookup_by_id(&self, id: &str) -> Option<String> {
        self.examples.lookup_by_id(id).map(|r| r.output.clone())
    }

    fn lookup_by_input(&self, input: &str) -> Option<String> {
        self.examples.lookup_by_input(input).map(|r| r.output.clone())
    }

    fn id_matches_document(&self, neighbor: &Neighbor) -> bool {
        self.examples
            .lookup_by_id(&neighbor.doc_id)
            .is_some_and(|record| record.input == neighbor.document)
    }
}
