//! Core data types for the Petpal knowledge base.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key carrying the record-kind discriminator.
pub const SOURCE_KEY: &str = "source";

/// Kind of platform record a document was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Post,
    Foundation,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Foundation => "foundation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "post" | "posts" => Some(Self::Post),
            "foundation" | "foundations" => Some(Self::Foundation),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar metadata value, as accepted by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// A natural-language rendering of one platform record.
///
/// Documents are immutable once built: fields are private and the builder
/// methods consume `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    metadata: BTreeMap<String, MetadataValue>,
}

impl Document {
    /// Create a document tagged with its record kind.
    pub fn new(content: impl Into<String>, source: SourceKind) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_KEY.to_string(), MetadataValue::from(source.as_str()));
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Rebuild a document from stored parts (index read path).
    pub fn from_parts(content: impl Into<String>, metadata: BTreeMap<String, MetadataValue>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(key)
    }

    /// Record kind from the `source` discriminator, if present and known.
    pub fn source(&self) -> Option<SourceKind> {
        self.get(SOURCE_KEY)
            .and_then(MetadataValue::as_str)
            .and_then(SourceKind::parse)
    }

    /// Whether the document has any indexable text.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Persisted form of a document inside the vector index.
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: Document,
}

/// One ranked retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
    pub document: Document,

    /// Cosine similarity (higher is closer)
    pub score: f32,
}

/// Documents ranked by descending similarity; at most `k` long.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievalHit>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.hits.iter().map(|hit| &hit.document)
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.hits.into_iter().map(|hit| hit.document).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_carries_source() {
        let doc = Document::new("ข้อมูลมูลนิธิ: ชื่อ บ้านแมว", SourceKind::Foundation)
            .with_metadata("foundation_id", 7_i64);

        assert_eq!(doc.source(), Some(SourceKind::Foundation));
        assert_eq!(doc.get("foundation_id").and_then(MetadataValue::as_i64), Some(7));
        assert!(!doc.is_blank());
    }

    #[test]
    fn test_metadata_untagged_serde() {
        let doc = Document::new("x", SourceKind::Post)
            .with_metadata("post_id", 3_i64)
            .with_metadata("pet_name", "ส้มโอ");

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["metadata"]["post_id"], 3);
        assert_eq!(json["metadata"]["source"], "post");

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_blank_document() {
        assert!(Document::new("  \n", SourceKind::Post).is_blank());
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!(SourceKind::parse("Posts"), Some(SourceKind::Post));
        assert_eq!(SourceKind::parse("foundation"), Some(SourceKind::Foundation));
        assert_eq!(SourceKind::parse("user"), None);
    }
}
