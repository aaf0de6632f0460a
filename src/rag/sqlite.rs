//! SQLite-backed vector collection.
//!
//! One database file per collection. Embeddings are stored as little-endian
//! f32 blobs and searched with a brute-force cosine scan.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{IndexedDocument, Neighbor, VectorIndex};
use crate::core::errors::ApiError;

pub struct SqliteVectorIndex {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteVectorIndex {
    /// Opens (creating if needed) the collection file and its parent dir.
    pub async fn open(db_path: &Path) -> Result<Self, ApiError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::internal(format!(
                    "Failed to create vector store dir {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let index = Self {
            pool,
            db_path: db_path.to_path_buf(),
        };
        index.init_schema().await?;
        Ok(index)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS embeddings (
                doc_id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collection_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn upsert_batch(&self, items: Vec<(IndexedDocument, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (doc, embedding) in &items {
            if embedding.is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "document {} has an empty embedding",
                    doc.doc_id
                )));
            }
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO embeddings (doc_id, document, embedding)
                 VALUES (?1, ?2, ?3)",
            )
            .bind(&doc.doc_id)
            .bind(&doc.document)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn query(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<Neighbor>, ApiError> {
        let rows = sqlx::query("SELECT doc_id, document, embedding FROM embeddings ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut scored: Vec<Neighbor> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let similarity = cosine_similarity(query_embedding, &stored);

                Some(Neighbor {
                    doc_id: row.get("doc_id"),
                    document: row.get("document"),
                    distance: 1.0 - similarity,
                })
            })
            .collect();

        // Stable sort: equal distances keep insertion order.
        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM embeddings")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar("SELECT value FROM collection_meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT OR REPLACE INTO collection_meta (key, value, updated_at)
             VALUES (?1, ?2, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_index() -> (tempfile::TempDir, SqliteVectorIndex) {
        let tmp = tempfile::tempdir().unwrap();
        let index = SqliteVectorIndex::open(&tmp.path().join("store").join("embeds.db"))
            .await
            .unwrap();
        (tmp, index)
    }

    fn doc(id: &str, text: &str) -> IndexedDocument {
        IndexedDocument {
            doc_id: id.to_string(),
            document: text.to_string(),
        }
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn query_returns_nearest_first() {
        let (_tmp, index) = test_index().await;
        index
            .upsert_batch(vec![
                (doc("0", "bakery"), vec![1.0, 0.0, 0.0]),
                (doc("1", "gym"), vec![0.0, 1.0, 0.0]),
                (doc("2", "florist"), vec![0.7, 0.7, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 3);

        let hits = index.query(&[0.9, 0.1, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, "0");
        assert_eq!(hits[0].document, "bakery");
        assert_eq!(hits[1].doc_id, "2");
        assert!(hits[0].distance < hits[1].distance);

        let exact = index.query(&[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(exact[0].doc_id, "1");
        assert!(exact[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_index_returns_no_neighbors() {
        let (_tmp, index) = test_index().await;
        assert!(index.query(&[1.0], 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("embeds.db");
        {
            let index = SqliteVectorIndex::open(&path).await.unwrap();
            index
                .upsert_batch(vec![(doc("0", "old"), vec![1.0, 0.0])])
                .await
                .unwrap();
            index
                .upsert_batch(vec![(doc("0", "new"), vec![0.0, 1.0])])
                .await
                .unwrap();
            index.set_meta("embedding_model", "m1").await.unwrap();
            index.pool.close().await;
        }

        let reopened = SqliteVectorIndex::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let hits = reopened.query(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].document, "new");
        assert_eq!(
            reopened.get_meta("embedding_model").await.unwrap().as_deref(),
            Some("m1")
        );
        assert!(reopened.get_meta("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_embedding_is_rejected() {
        let (_tmp, index) = test_index().await;
        let err = index
            .upsert_batch(vec![(doc("0", "x"), Vec::new())])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
