use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::db::DbConn;
use crate::error::Result;
use crate::models::institutional_id;
use crate::models::prelude::*;
use crate::models::user;
use crate::services::security::verify_password;

fn accept(candidate: Option<user::Model>, password: &str) -> Option<user::Model> {
    candidate.filter(|u| u.is_active && verify_password(password, &u.hashed_password))
}

/// Resolve credentials by username, then by a consumed institutional ID.
///
/// An ID that exists but was never used for registration matches no one.
pub async fn authenticate(
    db: &DbConn,
    identifier: &str,
    password: &str,
) -> Result<Option<user::Model>> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(None);
    }

    let by_username = User::find()
        .filter(user::Column::Username.eq(identifier))
        .one(db)
        .await?;
    if let Some(found) = accept(by_username, password) {
        return Ok(Some(found));
    }

    let record = InstitutionalId::find()
        .filter(institutional_id::Column::InstitutionalId.eq(identifier))
        .filter(institutional_id::Column::UsedBy.is_not_null())
        .one(db)
        .await?;

    let Some(user_id) = record.and_then(|r| r.used_by) else {
        return Ok(None);
    };

    let by_id = User::find_by_id(user_id).one(db).await?;
    Ok(accept(by_id, password))
}

/// Value of the institutional ID linked to a user, if any
pub async fn linked_institutional_id(db: &DbConn, user: &user::Model) -> Result<Option<String>> {
    let Some(record_id) = user.institutional_id_ref else {
        return Ok(None);
    };

    Ok(InstitutionalId::find_by_id(record_id)
        .one(db)
        .await?
        .map(|r| r.institutional_id))
}
