//! Self-registration gated by a one-time institutional ID.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use validator::{Validate, ValidateEmail};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::institutional_id::{self, AccountType};
use crate::models::prelude::*;
use crate::models::user;
use crate::schemas::user::{validate_username, RegisterRequest};
use crate::services::institutional_ids;
use crate::services::security::hash_password;

fn filled(submitted: Option<String>, fallback: &Option<String>) -> String {
    submitted
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.clone())
        .unwrap_or_default()
}

async fn ensure_unique<C: ConnectionTrait>(conn: &C, username: &str, email: &str) -> Result<()> {
    let username_taken = User::find()
        .filter(user::Column::Username.eq(username))
        .one(conn)
        .await?
        .is_some();
    if username_taken {
        return Err(AppError::Conflict(
            "A user with this username already exists.".to_string(),
        ));
    }

    let email_taken = User::find()
        .filter(user::Column::Email.eq(email))
        .one(conn)
        .await?
        .is_some();
    if email_taken {
        return Err(AppError::Conflict(
            "A user with this email already exists.".to_string(),
        ));
    }

    Ok(())
}

/// Register a new account, consuming the institutional ID.
///
/// Verification, user creation and marking the ID used share one transaction;
/// any failure leaves both the ID and the user table untouched.
pub async fn register(
    db: &DbConn,
    request: RegisterRequest,
) -> Result<(user::Model, institutional_id::Model)> {
    request.validate()?;

    let now = Utc::now();
    let txn = db.begin().await?;

    let record = institutional_ids::verify(&txn, &request.institutional_id, now).await?;

    let email = filled(request.email, &record.email);
    if email.is_empty() {
        return Err(AppError::Validation(
            "email: An email address is required".to_string(),
        ));
    }
    if !email.validate_email() {
        return Err(AppError::Validation(
            "email: Enter a valid email address".to_string(),
        ));
    }

    let username = request.username.trim().to_string();
    ensure_unique(&txn, &username, &email).await?;

    let account_type = record.parsed_account_type().unwrap_or(AccountType::Student);

    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        hashed_password: Set(hash_password(&request.password)?),
        first_name: Set(filled(request.first_name, &record.first_name)),
        last_name: Set(filled(request.last_name, &record.last_name)),
        is_active: Set(true),
        is_superuser: Set(false),
        student: Set(account_type == AccountType::Student),
        staff: Set(account_type == AccountType::Staff),
        academic_level: Set(record.academic_level.clone()),
        phone_number: Set(None),
        address: Set(None),
        date_of_birth: Set(None),
        institutional_id_ref: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        last_login: Set(None),
        ..Default::default()
    };
    let created = new_user.insert(&txn).await?;

    institutional_ids::mark_used(&txn, &record, created.id, now).await?;

    let mut linked: user::ActiveModel = created.into();
    linked.institutional_id_ref = Set(Some(record.id));
    let created = linked.update(&txn).await?;

    txn.commit().await?;

    let record = InstitutionalId::find_by_id(record.id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Institutional ID vanished after registration".to_string()))?;

    tracing::info!(
        "Registered user {} with institutional ID {}",
        created.username,
        record.institutional_id
    );

    Ok((created, record))
}

/// Create a superuser account that is not backed by an institutional ID
pub async fn create_administrator(
    db: &DbConn,
    username: &str,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    let username = username.trim();
    let email = email.trim().to_lowercase();

    if username.is_empty() || validate_username(username).is_err() {
        return Err(AppError::Validation(format!("Invalid username '{}'", username)));
    }
    if !email.validate_email() {
        return Err(AppError::Validation(format!("Invalid email '{}'", email)));
    }
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    ensure_unique(db, username, &email).await?;

    let now = Utc::now();
    let admin = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email),
        hashed_password: Set(hash_password(password)?),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_active: Set(true),
        is_superuser: Set(true),
        student: Set(false),
        staff: Set(true),
        academic_level: Set(None),
        phone_number: Set(None),
        address: Set(None),
        date_of_birth: Set(None),
        institutional_id_ref: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Created administrator {}", admin.username);
    Ok(admin)
}
