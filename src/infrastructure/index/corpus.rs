//! Pre-built passage corpus loading.
//!
//! Ingestion (chunking + embedding) is an external step; this crate
//! only reads its output: a JSON array of passages with pre-computed
//! embeddings. A missing or unreadable file is `IndexError::Unavailable`
//! at load time, before any request runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::IndexError;

/// One ingested passage with its pre-computed embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageRecord {
    pub id: String,
    pub text: String,
    pub source_file: String,
    pub embedding: Vec<f32>,
}

/// Load the corpus file produced by ingestion.
pub fn load_corpus(path: &Path) -> Result<Vec<PassageRecord>, IndexError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        IndexError::Unavailable(format!("cannot read {}: {err}", path.display()))
    })?;
    let records: Vec<PassageRecord> = serde_json::from_str(&raw).map_err(|err| {
        IndexError::Unavailable(format!("cannot parse {}: {err}", path.display()))
    })?;
    if records.is_empty() {
        return Err(IndexError::Unavailable(format!(
            "corpus {} contains no passages",
            path.display()
        )));
    }
    info!(passages = records.len(), path = %path.display(), "loaded passage corpus");
    Ok(records)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::PassageRecord;

    pub fn record(id: &str, text: &str, embedding: &[f32]) -> PassageRecord {
        PassageRecord {
            id: id.to_string(),
            text: text.to_string(),
            source_file: "dsm5.docx".to_string(),
            embedding: embedding.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = load_corpus(Path::new("/nonexistent/passages.json")).unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
        assert!(err.to_string().contains("run ingestion first"));
    }

    #[test]
    fn test_malformed_file_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_corpus(file.path()).unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }

    #[test]
    fn test_empty_corpus_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let err = load_corpus(file.path()).unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }

    #[test]
    fn test_loads_valid_corpus() {
        let records = vec![test_support::record("p1", "trầm cảm", &[0.1, 0.2])];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&records).unwrap()).unwrap();

        let loaded = load_corpus(file.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "p1");
    }
}
