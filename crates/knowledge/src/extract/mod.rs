//! Document extraction from the platform's relational store.
//!
//! Extraction is a pure read: records come from a [`RecordSource`] and each
//! eligible record is rendered into a [`Document`] with a deterministic
//! template. Records missing a required linkage are skipped, never fatal.

pub mod records;
pub mod sqlite;

pub use records::{FoundationRecord, Gender, PetRecord, PostRecord, PostType};
pub use sqlite::SqliteRecordSource;

use crate::types::{Document, SourceKind};
use petpal_core::AppResult;
use std::sync::Arc;

const UNKNOWN_BREED: &str = "ไม่ระบุสายพันธุ์";

/// Read-only source of platform records.
pub trait RecordSource: Send + Sync {
    /// Active posts, with their pet joined when the linkage exists.
    fn active_posts(&self) -> AppResult<Vec<PostRecord>>;

    /// Active foundations.
    fn active_foundations(&self) -> AppResult<Vec<FoundationRecord>>;
}

/// Renders platform records into documents.
#[derive(Clone)]
pub struct DocumentExtractor {
    source: Arc<dyn RecordSource>,
}

impl DocumentExtractor {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    /// Extract every eligible document: posts first, then foundations.
    pub fn extract_documents(&self) -> AppResult<Vec<Document>> {
        let posts = self.source.active_posts()?;
        let foundations = self.source.active_foundations()?;

        let mut documents = Vec::with_capacity(posts.len() + foundations.len());
        let mut skipped = 0usize;

        for post in &posts {
            match render_post(post) {
                Some(doc) => documents.push(doc),
                None => skipped += 1,
            }
        }
        for foundation in &foundations {
            match render_foundation(foundation) {
                Some(doc) => documents.push(doc),
                None => skipped += 1,
            }
        }

        tracing::info!(
            posts = posts.len(),
            foundations = foundations.len(),
            documents = documents.len(),
            skipped,
            "Extracted documents from record source"
        );

        Ok(documents)
    }
}

/// Render a post, or `None` when it has no pet.
pub fn render_post(post: &PostRecord) -> Option<Document> {
    let Some(pet) = post.pet.as_ref() else {
        tracing::debug!(post_id = post.id, "Skipping post without pet");
        return None;
    };

    let breed = pet
        .breed
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(UNKNOWN_BREED);

    let mut content = format!(
        "ข้อมูลประกาศ {}: ชื่อสัตว์เลี้ยง {}, สายพันธุ์ {}, เพศ {}. รายละเอียดเพิ่มเติม: {}",
        post.post_type.display_th(),
        pet.name,
        breed,
        pet.gender.display_th(),
        post.description.trim()
    );

    if let Some(phone) = post
        .contact_phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        content.push_str(" ติดต่อ: ");
        content.push_str(phone);
    }

    Some(
        Document::new(content, SourceKind::Post)
            .with_metadata("post_id", post.id)
            .with_metadata("pet_name", pet.name.clone()),
    )
}

/// Render a foundation, or `None` when it has no name.
pub fn render_foundation(foundation: &FoundationRecord) -> Option<Document> {
    if foundation.name.trim().is_empty() {
        tracing::debug!(foundation_id = foundation.id, "Skipping unnamed foundation");
        return None;
    }

    let content = format!(
        "ข้อมูลมูลนิธิ: ชื่อ {}, ที่อยู่ {}, เบอร์ติดต่อ {}",
        foundation.name.trim(),
        foundation.address.trim(),
        foundation.phone.trim()
    );

    Some(Document::new(content, SourceKind::Foundation).with_metadata("foundation_id", foundation.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetadataValue;

    struct FixedSource {
        posts: Vec<PostRecord>,
        foundations: Vec<FoundationRecord>,
    }

    impl RecordSource for FixedSource {
        fn active_posts(&self) -> AppResult<Vec<PostRecord>> {
            Ok(self.posts.clone())
        }

        fn active_foundations(&self) -> AppResult<Vec<FoundationRecord>> {
            Ok(self.foundations.clone())
        }
    }

    fn orange_cat_post() -> PostRecord {
        PostRecord {
            id: 11,
            post_type: PostType::Adoption,
            description: "แมวสีส้ม นิสัยขี้อ้อน ทำหมันแล้ว".to_string(),
            contact_phone: Some("0812345678".to_string()),
            pet: Some(PetRecord {
                name: "ส้มโอ".to_string(),
                breed: None,
                gender: Gender::Female,
            }),
        }
    }

    #[test]
    fn test_render_post_template() {
        let doc = render_post(&orange_cat_post()).unwrap();

        assert_eq!(
            doc.content(),
            "ข้อมูลประกาศ หาบ้าน: ชื่อสัตว์เลี้ยง ส้มโอ, สายพันธุ์ ไม่ระบุสายพันธุ์, เพศ ตัวเมีย. \
             รายละเอียดเพิ่มเติม: แมวสีส้ม นิสัยขี้อ้อน ทำหมันแล้ว ติดต่อ: 0812345678"
        );
        assert_eq!(doc.source(), Some(SourceKind::Post));
        assert_eq!(doc.get("post_id"), Some(&MetadataValue::Int(11)));
        assert_eq!(doc.get("pet_name").and_then(MetadataValue::as_str), Some("ส้มโอ"));
    }

    #[test]
    fn test_render_post_without_phone() {
        let mut post = orange_cat_post();
        post.contact_phone = Some("   ".to_string());
        let doc = render_post(&post).unwrap();
        assert!(!doc.content().contains("ติดต่อ"));
    }

    #[test]
    fn test_render_foundation_template() {
        let doc = render_foundation(&FoundationRecord {
            id: 2,
            name: "มูลนิธิรักแมว".to_string(),
            address: "กรุงเทพฯ".to_string(),
            phone: "021234567".to_string(),
        })
        .unwrap();

        assert_eq!(
            doc.content(),
            "ข้อมูลมูลนิธิ: ชื่อ มูลนิธิรักแมว, ที่อยู่ กรุงเทพฯ, เบอร์ติดต่อ 021234567"
        );
        assert_eq!(doc.get("foundation_id"), Some(&MetadataValue::Int(2)));
    }

    #[test]
    fn test_extract_skips_missing_linkage() {
        let mut orphan = orange_cat_post();
        orphan.id = 12;
        orphan.pet = None;

        let extractor = DocumentExtractor::new(Arc::new(FixedSource {
            posts: vec![orange_cat_post(), orphan],
            foundations: vec![FoundationRecord {
                id: 1,
                name: " ".to_string(),
                address: String::new(),
                phone: String::new(),
            }],
        }));

        let docs = extractor.extract_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("post_id"), Some(&MetadataValue::Int(11)));
    }

    #[test]
    fn test_extract_is_restartable() {
        let extractor = DocumentExtractor::new(Arc::new(FixedSource {
            posts: vec![orange_cat_post()],
            foundations: vec![],
        }));

        assert_eq!(
            extractor.extract_documents().unwrap(),
            extractor.extract_documents().unwrap()
        );
    }
}
