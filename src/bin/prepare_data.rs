//! Downloads a page of WebSight rows and writes the examples CSV.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use webcraft_backend::core::config::DatasetSettings;
use webcraft_backend::rag::dataset::{fetch_rows, write_csv};

#[derive(Debug, Parser)]
#[command(name = "webcraft-prepare-data", about = "Fetch dataset rows into the examples CSV")]
struct Args {
    /// Row offset into the dataset.
    #[arg(long)]
    offset: Option<u64>,

    /// Number of rows to fetch (the rows API caps a page at 100).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    length: Option<u32>,

    /// Output CSV. Defaults to `rag.examples_path`.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = webcraft_backend::bootstrap("prepare-data.log");
    let raw = config.load_config().context("Invalid configuration")?;

    let mut dataset = DatasetSettings::from_config(&raw);
    if let Some(offset) = args.offset {
        dataset.offset = offset;
    }
    if let Some(length) = args.length {
        dataset.length = length;
    }

    let out = match args.out {
        Some(path) => path,
        None => {
            let configured = raw
                .get("rag")
                .and_then(|rag| rag.get("examples_path"))
                .and_then(|v| v.as_str())
                .unwrap_or(webcraft_backend::core::config::defaults::DEFAULT_EXAMPLES_PATH);
            config.paths().resolve(configured)
        }
    };

    let client = reqwest::Client::new();
    let rows = fetch_rows(&client, &dataset).await?;
    write_csv(&rows, &out)?;

    tracing::info!(rows = rows.len(), out = %out.display(), "Wrote examples CSV");
    Ok(())
}
