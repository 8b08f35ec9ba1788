use std::env;
use std::path::PathBuf;

use super::env_parse;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory uploaded book files are written under
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            media_root: env::var("ACADEMIALINK_MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media")),
            max_upload_bytes: env_parse("ACADEMIALINK_MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
        }
    }
}
