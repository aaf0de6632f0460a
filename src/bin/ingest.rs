//! Embeds the examples CSV into the vector collection.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use webcraft_backend::llm::build_provider;
use webcraft_backend::rag::ingest::ingest_examples;
use webcraft_backend::rag::{ExampleStore, SqliteVectorIndex};

#[derive(Debug, Parser)]
#[command(name = "webcraft-ingest", about = "Embed the example store into the vector collection")]
struct Args {
    /// Examples CSV to ingest instead of `rag.examples_path`.
    #[arg(long)]
    examples: Option<PathBuf>,

    /// Override `rag.ingest_batch_size` (at most 100 per embedding call).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=100))]
    batch_size: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = webcraft_backend::bootstrap("ingest.log");
    let settings = config.load_settings().context("Invalid configuration")?;

    let examples_path = args
        .examples
        .unwrap_or_else(|| settings.rag.examples_path.clone());
    let examples = ExampleStore::load(&examples_path)
        .with_context(|| format!("Failed to load {}", examples_path.display()))?;

    let provider = build_provider(&settings.llm)?;
    let index = SqliteVectorIndex::open(&settings.rag.index_path()).await?;

    let batch_size = args
        .batch_size
        .map(|size| size as usize)
        .unwrap_or(settings.rag.ingest_batch_size);
    let report = ingest_examples(&examples, provider.as_ref(), &index, batch_size).await?;

    tracing::info!(
        documents = report.documents,
        batches = report.batches,
        collection = %index.db_path().display(),
        "Ingestion complete"
    );
    Ok(())
}
