//! SQLite-backed record source.
//!
//! Reads the platform's tables (`myapp_post`, `myapp_pet`, `myapp_animal`,
//! `myapp_foundation`) through a read-only connection.

use super::records::{FoundationRecord, Gender, PetRecord, PostRecord, PostType};
use super::RecordSource;
use petpal_core::{AppError, AppResult};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

const POSTS_QUERY: &str = r#"
    SELECT p.id, p.post_type, p.description, p.contact_phone,
           pet.id, pet.name, pet.gender, a.breed
    FROM myapp_post p
    LEFT JOIN myapp_pet pet ON pet.id = p.pet_id
    LEFT JOIN myapp_animal a ON a.id = pet.animal_id
    WHERE p.is_active = 1
    ORDER BY p.id
"#;

const FOUNDATIONS_QUERY: &str = r#"
    SELECT id, name, address, phone
    FROM myapp_foundation
    WHERE is_active = 1
    ORDER BY id
"#;

/// Record source over the platform's SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRecordSource {
    db_path: PathBuf,
}

impl SqliteRecordSource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> AppResult<Connection> {
        if !self.db_path.exists() {
            return Err(AppError::Store(format!(
                "Record database not found at {:?}",
                self.db_path
            )));
        }

        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| AppError::Store(format!("Failed to open {:?}: {}", self.db_path, e)))
    }
}

impl RecordSource for SqliteRecordSource {
    fn active_posts(&self) -> AppResult<Vec<PostRecord>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(POSTS_QUERY)
            .map_err(|e| AppError::Store(format!("Failed to prepare posts query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let pet_id: Option<i64> = row.get(4)?;
                let pet_name: Option<String> = row.get(5)?;
                let pet = match (pet_id, pet_name) {
                    (Some(_), Some(name)) => Some(PetRecord {
                        name,
                        breed: row.get(7)?,
                        gender: Gender::from_code(&row.get::<_, Option<String>>(6)?.unwrap_or_default()),
                    }),
                    _ => None,
                };

                Ok(PostRecord {
                    id: row.get(0)?,
                    post_type: PostType::from_code(&row.get::<_, String>(1)?),
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    contact_phone: row.get(3)?,
                    pet,
                })
            })
            .map_err(|e| AppError::Store(format!("Failed to query posts: {}", e)))?;

        let posts = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("Failed to read post row: {}", e)))?;

        tracing::debug!("Read {} active posts from {:?}", posts.len(), self.db_path);
        Ok(posts)
    }

    fn active_foundations(&self) -> AppResult<Vec<FoundationRecord>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(FOUNDATIONS_QUERY)
            .map_err(|e| AppError::Store(format!("Failed to prepare foundations query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FoundationRecord {
                    id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    address: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    phone: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })
            .map_err(|e| AppError::Store(format!("Failed to query foundations: {}", e)))?;

        let foundations = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("Failed to read foundation row: {}", e)))?;

        tracing::debug!(
            "Read {} active foundations from {:?}",
            foundations.len(),
            self.db_path
        );
        Ok(foundations)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rusqlite::Connection;
    use std::path::Path;

    /// Create a small platform database with the tables the source reads.
    pub fn seed_platform_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE myapp_animal (id INTEGER PRIMARY KEY, breed TEXT);
            CREATE TABLE myapp_pet (id INTEGER PRIMARY KEY, name TEXT NOT NULL, gender TEXT, animal_id INTEGER);
            CREATE TABLE myapp_post (
                id INTEGER PRIMARY KEY, post_type TEXT NOT NULL, description TEXT,
                contact_phone TEXT, is_active INTEGER NOT NULL, pet_id INTEGER
            );
            CREATE TABLE myapp_foundation (
                id INTEGER PRIMARY KEY, name TEXT, address TEXT, phone TEXT, is_active INTEGER NOT NULL
            );

            INSERT INTO myapp_animal VALUES (1, 'เปอร์เซีย');
            INSERT INTO myapp_pet VALUES (1, 'ส้มโอ', 'FEMALE', NULL);
            INSERT INTO myapp_pet VALUES (2, 'ถุงทอง', 'MALE', 1);

            INSERT INTO myapp_post VALUES (1, 'ADOPTION', 'แมวสีส้ม ขี้อ้อน', '0812345678', 1, 1);
            INSERT INTO myapp_post VALUES (2, 'LOST', 'หายแถวลาดพร้าว', NULL, 1, 2);
            INSERT INTO myapp_post VALUES (3, 'ADOPTION', 'ปิดประกาศแล้ว', NULL, 0, 2);
            INSERT INTO myapp_post VALUES (4, 'ADOPTION', 'ไม่มีสัตว์', NULL, 1, 99);

            INSERT INTO myapp_foundation VALUES (1, 'มูลนิธิรักแมว', 'กรุงเทพฯ', '021234567', 1);
            INSERT INTO myapp_foundation VALUES (2, 'มูลนิธิปิดตัว', 'เชียงใหม่', '053000000', 0);
            "#,
        )
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::seed_platform_db;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_active_posts_with_joins() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("petpal.sqlite3");
        seed_platform_db(&db);

        let posts = SqliteRecordSource::new(&db).active_posts().unwrap();
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 4]);

        let first = &posts[0];
        assert_eq!(first.post_type, PostType::Adoption);
        let pet = first.pet.as_ref().unwrap();
        assert_eq!(pet.name, "ส้มโอ");
        assert_eq!(pet.breed, None);
        assert_eq!(pet.gender, Gender::Female);

        assert_eq!(
            posts[1].pet.as_ref().unwrap().breed.as_deref(),
            Some("เปอร์เซีย")
        );
        // Dangling pet reference surfaces as a post without pet
        assert!(posts[2].pet.is_none());
    }

    #[test]
    fn test_reads_active_foundations() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("petpal.sqlite3");
        seed_platform_db(&db);

        let foundations = SqliteRecordSource::new(&db).active_foundations().unwrap();
        assert_eq!(foundations.len(), 1);
        assert_eq!(foundations[0].name, "มูลนิธิรักแมว");
    }

    #[test]
    fn test_missing_database_is_store_error() {
        let temp = TempDir::new().unwrap();
        let source = SqliteRecordSource::new(temp.path().join("absent.sqlite3"));
        assert!(matches!(source.active_posts(), Err(AppError::Store(_))));
    }
}
