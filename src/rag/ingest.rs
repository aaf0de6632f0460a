//! Loads the example table into the vector collection and records enough
//! metadata to notice later when the two drift apart.

use futures_util::stream::{self, StreamExt};

use super::examples::ExampleStore;
use super::store::{IndexedDocument, VectorIndex};
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

pub const META_EMBEDDING_MODEL: &str = "embedding_model";
pub const META_EXAMPLES_SHA256: &str = "examples_sha256";
pub const META_ROW_COUNT: &str = "row_count";
pub const META_INGESTED_AT: &str = "ingested_at";

/// Embedding requests in flight at once.
const EMBED_CONCURRENCY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub batches: usize,
}

/// Embeds every `input` and upserts it under its row id. Re-running replaces
/// existing rows.
pub async fn ingest_examples(
    examples: &ExampleStore,
    embedder: &dyn LlmProvider,
    index: &dyn VectorIndex,
    batch_size: usize,
) -> Result<IngestReport, ApiError> {
    let batch_size = batch_size.max(1);
    let documents: Vec<IndexedDocument> = examples
        .documents()
        .map(|(doc_id, record)| IndexedDocument {
            doc_id,
            document: record.input.clone(),
        })
        .collect();
    let total = documents.len();
    let batches: Vec<Vec<IndexedDocument>> = documents
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect();
    let batch_count = batches.len();

    let mut embedded = stream::iter(
        batches
            .into_iter()
            .map(|batch| embed_batch(embedder, batch)),
    )
    .buffered(EMBED_CONCURRENCY);

    let mut done = 0usize;
    while let Some(items) = embedded.next().await {
        let items = items?;
        done += items.len();
        index.upsert_batch(items).await?;
        tracing::info!(done, total, "Ingested batch");
    }

    index
        .set_meta(META_EMBEDDING_MODEL, embedder.embedding_model())
        .await?;
    index
        .set_meta(META_EXAMPLES_SHA256, examples.fingerprint())
        .await?;
    index
        .set_meta(META_ROW_COUNT, &examples.len().to_string())
        .await?;
    index
        .set_meta(META_INGESTED_AT, &chrono::Utc::now().to_rfc3339())
        .await?;

    Ok(IngestReport {
        documents: total,
        batches: batch_count,
    })
}

async fn embed_batch(
    embedder: &dyn LlmProvider,
    batch: Vec<IndexedDocument>,
) -> Result<Vec<(IndexedDocument, Vec<f32>)>, ApiError> {
    let inputs: Vec<String> = batch.iter().map(|d| d.document.clone()).collect();
    let vectors = embedder.embed(&inputs).await?;
    if vectors.len() != batch.len() {
        return Err(ApiError::malformed(format!(
            "embedded {} of {} documents",
            vectors.len(),
            batch.len()
        )));
    }
    Ok(batch.into_iter().zip(vectors).collect())
}

/// Consistency problems between the collection and the loaded table. None of
/// these stop the server; they explain later `NotFound`s.
pub async fn collection_warnings(
    examples: &ExampleStore,
    embedding_model: &str,
    index: &dyn VectorIndex,
) -> Result<Vec<String>, ApiError> {
    let mut warnings = Vec::new();

    let count = index.count().await?;
    if count == 0 {
        warnings.push("vector collection is empty; run `webcraft-ingest` first".to_string());
        return Ok(warnings);
    }
    if count != examples.len() {
        warnings.push(format!(
            "vector collection holds {} documents but the example store has {} rows",
            count,
            examples.len()
        ));
    }

    if let Some(recorded) = index.get_meta(META_EXAMPLES_SHA256).await? {
        if recorded != examples.fingerprint() {
            warnings.push(
                "examples file changed since the collection was ingested; re-run `webcraft-ingest`"
                    .to_string(),
            );
        }
    }

    if let Some(recorded) = index.get_meta(META_EMBEDDING_MODEL).await? {
        if recorded != embedding_model {
            warnings.push(format!(
                "collection was embedded with `{}` but `{}` is configured",
                recorded, embedding_model
            ));
        }
    }

    Ok(warnings)
}
