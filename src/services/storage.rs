//! On-disk storage for uploaded book files.
//!
//! Files live under the media root as `books/<uuid>.<ext>`; the database only
//! records the path relative to the root.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::book_file::{file_extension, ALLOWED_EXTENSIONS};

const BOOKS_DIR: &str = "books";

/// A file written to the media root
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub stored_path: String,
    pub file_size: i64,
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate an upload name and return its lower-cased extension
    pub fn check_extension(file_name: &str) -> Result<String> {
        let ext = file_extension(file_name).ok_or_else(|| {
            AppError::BadRequest(format!("File '{}' has no extension", file_name))
        })?;

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::BadRequest(format!(
                "File type '.{}' is not allowed. Allowed types: {}",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        Ok(ext)
    }

    /// Write an uploaded book file under a fresh name
    pub async fn save_book_file(&self, file_name: &str, data: &[u8]) -> Result<StoredFile> {
        let ext = Self::check_extension(file_name)?;

        let dir = self.root.join(BOOKS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let stored_path = format!("{}/{}.{}", BOOKS_DIR, uuid::Uuid::new_v4(), ext);
        let mut file = tokio::fs::File::create(self.root.join(&stored_path)).await?;
        file.write_all(data).await?;
        file.flush().await?;

        tracing::debug!("Stored {} ({} bytes) at {}", file_name, data.len(), stored_path);

        Ok(StoredFile {
            file_name: file_name.to_string(),
            stored_path,
            file_size: data.len() as i64,
        })
    }

    /// Best-effort removal used when a multi-file upload fails part way
    pub async fn remove(&self, stored_path: &str) {
        if let Ok(path) = self.resolve(stored_path) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }

    /// Resolve a stored path to an existing file inside the media root
    pub fn resolve(&self, stored_path: &str) -> Result<PathBuf> {
        let base_path = self
            .root
            .canonicalize()
            .map_err(|e| AppError::Internal(format!("Failed to resolve media root: {}", e)))?;

        let clean_path = stored_path.trim_start_matches('/');
        let resolved = base_path
            .join(clean_path)
            .canonicalize()
            .map_err(|_| AppError::NotFound("File not found on disk".to_string()))?;

        if !resolved.starts_with(&base_path) {
            return Err(AppError::Forbidden(
                "Access denied: path traversal attempt detected".to_string(),
            ));
        }

        if !resolved.is_file() {
            return Err(AppError::NotFound("File not found on disk".to_string()));
        }

        Ok(resolved)
    }

    pub async fn open(&self, stored_path: &str) -> Result<tokio::fs::File> {
        let path = self.resolve(stored_path)?;
        Ok(tokio::fs::File::open(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_extension() {
        assert_eq!(MediaStorage::check_extension("Notes.PDF").unwrap(), "pdf");
        assert!(matches!(
            MediaStorage::check_extension("payload.exe"),
            Err(AppError::BadRequest(_))
        ));
        assert!(MediaStorage::check_extension("README").is_err());
    }

    #[tokio::test]
    async fn test_save_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let stored = storage.save_book_file("chapter1.txt", b"hello").await.unwrap();
        assert!(stored.stored_path.starts_with("books/"));
        assert!(stored.stored_path.ends_with(".txt"));
        assert_eq!(stored.file_size, 5);

        let path = storage.resolve(&stored.stored_path).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("media");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"x").unwrap();

        let storage = MediaStorage::new(&root);
        assert!(matches!(
            storage.resolve("../secret.txt"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            storage.resolve("books/missing.pdf"),
            Err(AppError::NotFound(_))
        ));
    }
}
