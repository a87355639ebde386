//! Platform records consumed by the extractor.

/// Kind of post published on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostType {
    Adoption,
    Lost,
    Other(String),
}

impl PostType {
    /// Parse the stored code (`ADOPTION`, `LOST`).
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "ADOPTION" => Self::Adoption,
            "LOST" => Self::Lost,
            _ => Self::Other(code.trim().to_string()),
        }
    }

    /// Label shown to users.
    pub fn display_th(&self) -> &str {
        match self {
            Self::Adoption => "หาบ้าน",
            Self::Lost => "ตามหา",
            Self::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "MALE" | "M" => Self::Male,
            "FEMALE" | "F" => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn display_th(&self) -> &'static str {
        match self {
            Self::Male => "ตัวผู้",
            Self::Female => "ตัวเมีย",
            Self::Unknown => "ไม่ทราบเพศ",
        }
    }
}

/// Pet joined onto a post.
#[derive(Debug, Clone, PartialEq)]
pub struct PetRecord {
    pub name: String,
    pub breed: Option<String>,
    pub gender: Gender,
}

/// An active post; `pet` is `None` when the linkage is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: i64,
    pub post_type: PostType,
    pub description: String,
    pub contact_phone: Option<String>,
    pub pet: Option<PetRecord>,
}

/// An active foundation.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundationRecord {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_type_codes() {
        assert_eq!(PostType::from_code("adoption"), PostType::Adoption);
        assert_eq!(PostType::from_code("LOST").display_th(), "ตามหา");
        assert_eq!(PostType::from_code("FOUND").display_th(), "FOUND");
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::from_code("female"), Gender::Female);
        assert_eq!(Gender::from_code("").display_th(), "ไม่ทราบเพศ");
    }
}
