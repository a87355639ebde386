//! Ingestion checkpoint ledger.
//!
//! Records a fingerprint of every document that made it into the index so an
//! incremental run can skip documents that were already ingested.

use crate::types::Document;
use chrono::{DateTime, Utc};
use petpal_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// SHA-256 over the document content and its metadata.
pub fn fingerprint(document: &Document) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.content().as_bytes());
    hasher.update([0u8]);
    // BTreeMap serializes in key order, so this is stable.
    if let Ok(metadata) = serde_json::to_vec(document.metadata()) {
        hasher.update(&metadata);
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    updated_at: Option<DateTime<Utc>>,
    fingerprints: BTreeSet<String>,
}

/// On-disk set of ingested document fingerprints.
#[derive(Debug)]
pub struct IngestLedger {
    path: PathBuf,
    file: LedgerFile,
}

impl IngestLedger {
    /// Load the ledger at `path`; a missing file yields an empty ledger.
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                AppError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to read ingest ledger {}: {}", path.display(), e),
                ))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                AppError::Serialization(format!(
                    "Invalid ingest ledger {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            LedgerFile::default()
        };

        tracing::debug!(
            path = %path.display(),
            entries = file.fingerprints.len(),
            "Loaded ingest ledger"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// A fresh ledger at `path`, ignoring whatever the file holds.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: LedgerFile::default(),
        }
    }

    pub fn contains(&self, document: &Document) -> bool {
        self.file.fingerprints.contains(&fingerprint(document))
    }

    pub fn record(&mut self, document: &Document) {
        self.file.fingerprints.insert(fingerprint(document));
    }

    pub fn len(&self) -> usize {
        self.file.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.fingerprints.is_empty()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.file.updated_at
    }

    /// Write the ledger back to disk, creating parent directories.
    pub fn save(&mut self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.file.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&self.file)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;
    use tempfile::TempDir;

    fn post(content: &str, id: i64) -> Document {
        Document::new(content, SourceKind::Post).with_metadata("post_id", id)
    }

    #[test]
    fn test_fingerprint_covers_metadata() {
        assert_eq!(fingerprint(&post("a", 1)), fingerprint(&post("a", 1)));
        assert_ne!(fingerprint(&post("a", 1)), fingerprint(&post("a", 2)));
        assert_ne!(fingerprint(&post("a", 1)), fingerprint(&post("b", 1)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".petpal").join("ingest_ledger.json");

        let mut ledger = IngestLedger::load(&path).unwrap();
        assert!(ledger.is_empty());
        ledger.record(&post("ข้อมูลประกาศ หาบ้าน", 1));
        ledger.save().unwrap();

        let reloaded = IngestLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains(&post("ข้อมูลประกาศ หาบ้าน", 1)));
        assert!(!reloaded.contains(&post("ข้อมูลประกาศ ตามหา", 2)));
        assert!(reloaded.updated_at().is_some());
    }

    #[test]
    fn test_corrupt_ledger_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            IngestLedger::load(&path),
            Err(AppError::Serialization(_))
        ));
    }
}
