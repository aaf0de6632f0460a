//! Retrieval side of the pipeline.
//!
//! - `ExampleStore`: the `input -> output` table loaded from CSV
//! - `VectorIndex` / `SqliteVectorIndex`: the persistent similarity index
//! - `ExampleRepository` / `IndexedExamples`: both behind one interface
//! - `Retriever`: prompt -> nearest stored website
//! - `ingest` and `dataset`: the offline steps that build the above

pub mod dataset;
pub mod examples;
pub mod ingest;
pub mod repository;
pub mod retriever;
pub mod sqlite;
pub mod store;

pub use examples::{ExampleRecord, ExampleStore, ExampleStoreError};
pub use repository::{ExampleRepository, IndexedExamples};
pub use retriever::Retriever;
pub use sqlite::SqliteVectorIndex;
pub use store::{IndexedDocument, Neighbor, VectorIndex};
