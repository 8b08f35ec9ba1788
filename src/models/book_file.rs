use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Extensions accepted on upload
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["pdf", "doc", "docx", "txt", "jpg", "jpeg", "png"];

/// Extensions that can be rendered inline
pub const PREVIEWABLE_EXTENSIONS: [&str; 5] = ["pdf", "jpg", "jpeg", "png", "txt"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub book_id: i64,
    /// Name the file was uploaded with
    pub file_name: String,
    /// Location relative to the media root
    #[serde(skip_serializing)]
    pub stored_path: String,
    pub file_size: Option<i64>,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_delete = "Cascade"
    )]
    Book,
    #[sea_orm(has_many = "super::book_download::Entity")]
    Downloads,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::book_download::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Downloads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Lower-cased extension of the uploaded name
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_name)
    }
}

pub fn file_extension(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Content type used when serving a previewable file inline
pub fn preview_content_type(extension: &str) -> Option<&'static str> {
    match extension {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "txt" => Some("text/plain; charset=utf-8"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_is_lowercased() {
        assert_eq!(file_extension("Thesis.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("notes.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("README"), None);
    }

    #[test]
    fn test_every_previewable_type_has_content_type() {
        for ext in PREVIEWABLE_EXTENSIONS {
            assert!(preview_content_type(ext).is_some(), "{ext}");
            assert!(ALLOWED_EXTENSIONS.contains(&ext));
        }
        assert_eq!(preview_content_type("docx"), None);
    }
}
