//! Example Store: the `input -> output` table the vector collection was
//! built from.
//!
//! Row order is significant. Row `i` (0-based, header excluded) is indexed
//! under document id `"i"`, so the ingestion step and the server must load the
//! same file for ids to resolve.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const INPUT_COLUMN: &str = "input";
pub const OUTPUT_COLUMN: &str = "output";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRecord {
    /// Text that was embedded and indexed.
    pub input: String,
    /// Website source returned when `input` is the nearest match.
    pub output: String,
}

#[derive(Debug, Error)]
pub enum ExampleStoreError {
    #[error("failed to read examples file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid examples CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("examples CSV has no `{0}` column")]
    MissingColumn(&'static str),
    #[error("examples CSV contains no rows")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct ExampleStore {
    records: Vec<ExampleRecord>,
    by_input: HashMap<String, usize>,
    fingerprint: String,
}

impl ExampleStore {
    pub fn load(path: &Path) -> Result<Self, ExampleStoreError> {
        let bytes = fs::read(path).map_err(|source| ExampleStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records = parse_csv(bytes.as_slice())?;
        let store = Self::build(records, hex::encode(Sha256::digest(&bytes)))?;
        tracing::info!(
            path = %path.display(),
            rows = store.len(),
            "Loaded example store"
        );
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ExampleStoreError> {
        let records = parse_csv(reader)?;
        Self::from_records(records)
    }

    pub fn from_records(records: Vec<ExampleRecord>) -> Result<Self, ExampleStoreError> {
        let mut hasher = Sha256::new();
        for record in &records {
            hasher.update(record.input.as_bytes());
            hasher.update([0u8]);
            hasher.update(record.output.as_bytes());
            hasher.update([0u8]);
        }
        Self::build(records, hex::encode(hasher.finalize()))
    }

    fn build(records: Vec<ExampleRecord>, fingerprint: String) -> Result<Self, ExampleStoreError> {
        if records.is_empty() {
            return Err(ExampleStoreError::Empty);
        }

        let mut by_input = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            // First row wins for duplicated inputs.
            by_input.entry(record.input.clone()).or_insert(idx);
        }

        Ok(Self {
            records,
            by_input,
            fingerprint,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ExampleRecord] {
        &self.records
    }

    /// SHA-256 of the source file (or of the records when built in memory).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn document_id(index: usize) -> String {
        index.to_string()
    }

    /// `(document id, record)` pairs in row order.
    pub fn documents(&self) -> impl Iterator<Item = (String, &ExampleRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| (Self::document_id(idx), record))
    }

    pub fn lookup_by_id(&self, id: &str) -> Option<&ExampleRecord> {
        let idx = id.trim().parse::<usize>().ok()?;
        self.records.get(idx)
    }

    pub fn lookup_by_input(&self, input: &str) -> Option<&ExampleRecord> {
        self.by_input.get(input).and_then(|idx| self.records.get(*idx))
    }
}

fn parse_csv<R: Read>(reader: R) -> Result<Vec<ExampleRecord>, ExampleStoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(ExampleStoreError::MissingColumn(name))
    };
    let input_idx = column(INPUT_COLUMN)?;
    let output_idx = column(OUTPUT_COLUMN)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        records.push(ExampleRecord {
            input: row.get(input_idx).unwrap_or_default().to_string(),
            output: row.get(output_idx).unwrap_or_default().to_string(),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "output,image,input\n\
\"<html>\n<body>bakery</body>\n</html>\",img1.png,A landing page for a bakery\n\
\"<html><body>gym, \"\"fit\"\"</body></html>\",img2.png,A gym membership site\n";

    #[test]
    fn parses_columns_by_header_name() {
        let store = ExampleStore::from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].input, "A landing page for a bakery");
        assert_eq!(
            store.records()[0].output,
            "<html>\n<body>bakery</body>\n</html>"
        );
        assert_eq!(
            store.records()[1].output,
            "<html><body>gym, \"fit\"</body></html>"
        );
    }

    #[test]
    fn row_order_defines_document_ids() {
        let store = ExampleStore::from_reader(SAMPLE.as_bytes()).unwrap();
        let ids: Vec<String> = store.documents().map(|(id, _)| id).collect();

        assert_eq!(ids, vec!["0", "1"]);
        assert_eq!(
            store.lookup_by_id("1").unwrap().input,
            "A gym membership site"
        );
        assert!(store.lookup_by_id("2").is_none());
        assert!(store.lookup_by_id("not-a-number").is_none());
    }

    #[test]
    fn lookup_by_input_prefers_first_duplicate() {
        let store = ExampleStore::from_records(vec![
            ExampleRecord { input: "same".into(), output: "first".into() },
            ExampleRecord { input: "same".into(), output: "second".into() },
        ])
        .unwrap();

        assert_eq!(store.lookup_by_input("same").unwrap().output, "first");
        assert!(store.lookup_by_input("other").is_none());
    }

    #[test]
    fn missing_column_and_empty_file_are_errors() {
        let err = ExampleStore::from_reader("input,text\na,b\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ExampleStoreError::MissingColumn("output")));

        let err = ExampleStore::from_reader("input,output\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ExampleStoreError::Empty));
    }

    #[test]
    fn load_fingerprints_file_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.csv");
        fs::write(&path, SAMPLE).unwrap();

        let first = ExampleStore::load(&path).unwrap();
        let again = ExampleStore::load(&path).unwrap();
        assert_eq!(first.fingerprint(), again.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);

        fs::write(&path, SAMPLE.replace("bakery", "florist")).unwrap();
        let changed = ExampleStore::load(&path).unwrap();
        assert_ne!(first.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ExampleStore::load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ExampleStoreError::Io { .. }));
    }
}
