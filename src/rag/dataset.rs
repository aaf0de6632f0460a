//! Data preparation: pulls a page of WebSight rows from the Hugging Face
//! datasets server and reshapes it into the examples CSV.

use std::path::Path;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::DatasetSettings;
use crate::core::errors::ApiError;

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: WebSightRow,
}

#[derive(Debug, Deserialize)]
struct WebSightRow {
    text: String,
    llm_generated_idea: String,
    #[serde(default)]
    image: Option<ImageCell>,
}

#[derive(Debug, Deserialize)]
struct ImageCell {
    #[serde(default)]
    src: Option<String>,
}

/// One CSV row. Field order is the column order on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRow {
    pub output: String,
    pub image: String,
    pub input: String,
}

impl From<WebSightRow> for DatasetRow {
    fn from(row: WebSightRow) -> Self {
        DatasetRow {
            output: row.text,
            image: row.image.and_then(|i| i.src).unwrap_or_default(),
            input: row.llm_generated_idea,
        }
    }
}

pub async fn fetch_rows(
    client: &Client,
    settings: &DatasetSettings,
) -> Result<Vec<DatasetRow>, ApiError> {
    tracing::info!(
        url = %settings.source_url,
        offset = settings.offset,
        length = settings.length,
        "Fetching dataset rows"
    );

    let res = client
        .get(&settings.source_url)
        .query(&[
            ("offset", settings.offset.to_string()),
            ("length", settings.length.to_string()),
        ])
        .send()
        .await
        .map_err(ApiError::from_upstream)?;

    let status = res.status();
    if !status.is_success() {
        return Err(ApiError::unavailable(format!(
            "failed to fetch dataset rows, status {}",
            status
        )));
    }

    let body = res.text().await.map_err(ApiError::from_upstream)?;
    parse_rows_page(&body)
}

fn parse_rows_page(body: &str) -> Result<Vec<DatasetRow>, ApiError> {
    let page: RowsPage = serde_json::from_str(body).map_err(ApiError::malformed)?;
    Ok(page.rows.into_iter().map(|entry| entry.row.into()).collect())
}

pub fn write_csv(rows: &[DatasetRow], path: &Path) -> Result<(), ApiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(ApiError::internal)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(ApiError::internal)?;
    for row in rows {
        writer.serialize(row).map_err(ApiError::internal)?;
    }
    writer.flush().map_err(ApiError::internal)?;
    Ok(())
}
