//! Book file access control and download tracking.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::middleware::ClientMeta;
use crate::models::book_download;
use crate::models::book_file;
use crate::models::prelude::*;
use crate::models::user;
use crate::services::borrow::has_approved_borrow;

/// How a permitted file is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Download,
    Preview,
}

/// Staff and admins always; students only with an approved borrow
pub async fn can_access_book(db: &DbConn, user: &user::Model, book_id: i64) -> Result<bool> {
    if user.is_staff_member() {
        return Ok(true);
    }
    if user.student {
        return has_approved_borrow(db, book_id, user.id).await;
    }
    Ok(false)
}

/// Record one access. Never fails the caller; errors are logged.
pub async fn record_download(
    db: &DbConn,
    file: &book_file::Model,
    user: &user::Model,
    client: &ClientMeta,
) {
    let event = book_download::ActiveModel {
        book_file_id: Set(file.id),
        user_id: Set(user.id),
        downloaded_at: Set(Utc::now()),
        ip_address: Set(client.ip_address.clone()),
        user_agent: Set(client.user_agent.clone()),
        ..Default::default()
    };

    if let Err(e) = event.insert(db).await {
        tracing::warn!(
            "Failed to record download of file {} by user {}: {}",
            file.id,
            user.id,
            e
        );
    }
}

/// Check access to a file.
///
/// Nothing is logged here; callers record the access once the stored bytes
/// are open. Preview is limited to types a browser can render inline.
pub async fn authorize_file(
    db: &DbConn,
    user: &user::Model,
    file_id: i64,
    mode: AccessMode,
) -> Result<book_file::Model> {
    let file = BookFile::find_by_id(file_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {} not found", file_id)))?;

    if !can_access_book(db, user, file.book_id).await? {
        return Err(AppError::Forbidden(
            "You need an approved borrow request to access this book".to_string(),
        ));
    }

    if mode == AccessMode::Preview {
        let previewable = file
            .extension()
            .is_some_and(|ext| book_file::PREVIEWABLE_EXTENSIONS.contains(&ext.as_str()));
        if !previewable {
            return Err(AppError::Forbidden(
                "Preview not available for this file type".to_string(),
            ));
        }
    }

    Ok(file)
}
