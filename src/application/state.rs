use crate::config::library::LibraryConfig;
use crate::config::CONFIG;
use crate::db::DbConn;
use crate::services::audit::AuditService;
use crate::services::storage::MediaStorage;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub audit: AuditService,
    pub storage: MediaStorage,
    pub library: LibraryConfig,
}

impl AppState {
    pub fn new(db: DbConn, storage: MediaStorage, library: LibraryConfig) -> Self {
        Self {
            audit: AuditService::new(db.clone()),
            db,
            storage,
            library,
        }
    }

    /// Build state from the process configuration
    pub fn from_config(db: DbConn) -> Self {
        Self::new(
            db,
            MediaStorage::new(CONFIG.storage.media_root.clone()),
            CONFIG.library.clone(),
        )
    }
}
