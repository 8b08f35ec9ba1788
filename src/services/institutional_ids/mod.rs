//! Institutional ID registry: verification, one-time consumption and the
//! administrative operations that provision IDs.

pub mod csv;

use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use thiserror::Error;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::institutional_id::{self, AcademicLevel, AccountType, IdStatus};
use crate::models::prelude::*;
use crate::schemas::institutional_id::{
    CreateInstitutionalIdRequest, GenerateIdsRequest, ListIdsQuery, UpdateInstitutionalIdRequest,
};

/// Largest batch the bulk generator accepts
pub const MAX_GENERATE: u32 = 100;

/// Why an institutional ID cannot be used for registration
#[derive(Debug, Error)]
pub enum IdVerificationError {
    #[error(
        "Invalid institutional ID. Please contact the library administration if you believe this is an error."
    )]
    NotFound,

    #[error("This institutional ID has already been used for registration.")]
    AlreadyUsed,

    #[error("This institutional ID has expired. Please contact administration.")]
    Expired,

    #[error("This institutional ID has been revoked. Please contact administration.")]
    Revoked,

    #[error("This institutional ID is not available for registration.")]
    Unavailable,

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl From<IdVerificationError> for AppError {
    fn from(err: IdVerificationError) -> Self {
        match err {
            IdVerificationError::NotFound => AppError::NotFound(err.to_string()),
            IdVerificationError::Database(e) => AppError::Database(e),
            other => AppError::Unavailable(other.to_string()),
        }
    }
}

/// Look up a candidate ID and check that it can still be consumed.
///
/// The stored status is checked first; an `active` record whose expiry has
/// passed is still rejected as expired.
pub async fn verify<C: ConnectionTrait>(
    conn: &C,
    value: &str,
    now: DateTime<Utc>,
) -> std::result::Result<institutional_id::Model, IdVerificationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(IdVerificationError::NotFound);
    }

    let record = InstitutionalId::find()
        .filter(institutional_id::Column::InstitutionalId.eq(value))
        .one(conn)
        .await?
        .ok_or(IdVerificationError::NotFound)?;

    match record.parsed_status() {
        Some(IdStatus::Active) => {}
        Some(IdStatus::Used) => return Err(IdVerificationError::AlreadyUsed),
        Some(IdStatus::Expired) => return Err(IdVerificationError::Expired),
        Some(IdStatus::Revoked) => return Err(IdVerificationError::Revoked),
        None => return Err(IdVerificationError::Unavailable),
    }

    if record.is_expired_at(now) {
        return Err(IdVerificationError::Expired);
    }

    Ok(record)
}

/// Consume an ID for `user_id`.
///
/// The update only matches rows that are still active, so two registrations
/// racing for the same ID cannot both succeed.
pub async fn mark_used<C: ConnectionTrait>(
    conn: &C,
    record: &institutional_id::Model,
    user_id: i64,
    now: DateTime<Utc>,
) -> std::result::Result<(), IdVerificationError> {
    let result = InstitutionalId::update_many()
        .col_expr(
            institutional_id::Column::Status,
            Expr::value(IdStatus::Used.as_str()),
        )
        .col_expr(institutional_id::Column::UsedAt, Expr::value(now))
        .col_expr(institutional_id::Column::UsedBy, Expr::value(user_id))
        .col_expr(institutional_id::Column::UpdatedAt, Expr::value(now))
        .filter(institutional_id::Column::Id.eq(record.id))
        .filter(institutional_id::Column::Status.eq(IdStatus::Active.as_str()))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(IdVerificationError::AlreadyUsed);
    }

    Ok(())
}

/// Random 8-digit candidate: type prefix followed by 7 digits
pub fn candidate_id(account_type: AccountType) -> String {
    let mut rng = rand::rng();
    let digits: u32 = rng.random_range(0..10_000_000);
    format!("{}{:07}", account_type.id_prefix(), digits)
}

/// Generate an ID value that no stored record uses yet
pub async fn generate_unique_id<C: ConnectionTrait>(
    conn: &C,
    account_type: AccountType,
) -> Result<String> {
    loop {
        let candidate = candidate_id(account_type);
        let taken = InstitutionalId::find()
            .filter(institutional_id::Column::InstitutionalId.eq(candidate.as_str()))
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
        tracing::debug!("Generated institutional ID {} collides, retrying", candidate);
    }
}

/// Returns true when a record with this value already exists
pub async fn exists<C: ConnectionTrait>(conn: &C, value: &str) -> Result<bool> {
    Ok(InstitutionalId::find()
        .filter(institutional_id::Column::InstitutionalId.eq(value))
        .one(conn)
        .await?
        .is_some())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fields shared by every way of creating a record
#[derive(Debug, Clone, Default)]
pub struct NewInstitutionalId {
    pub value: String,
    pub account_type: Option<AccountType>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub academic_level: Option<AcademicLevel>,
    pub department: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Insert an active record. Callers check uniqueness of the value first.
pub async fn insert<C: ConnectionTrait>(
    conn: &C,
    new: NewInstitutionalId,
    added_by: Option<i64>,
) -> Result<institutional_id::Model> {
    let now = Utc::now();
    let record = institutional_id::ActiveModel {
        institutional_id: Set(new.value),
        account_type: Set(new
            .account_type
            .unwrap_or(AccountType::Student)
            .to_string()),
        status: Set(IdStatus::Active.to_string()),
        first_name: Set(non_empty(new.first_name)),
        last_name: Set(non_empty(new.last_name)),
        email: Set(non_empty(new.email)),
        academic_level: Set(new.academic_level.map(|l| l.to_string())),
        department: Set(non_empty(new.department)),
        created_at: Set(now),
        updated_at: Set(now),
        expires_at: Set(new.expires_at),
        used_at: Set(None),
        used_by: Set(None),
        added_by: Set(added_by),
        notes: Set(non_empty(new.notes)),
        ..Default::default()
    };

    Ok(record.insert(conn).await?)
}

/// Create a single record, generating the value when none was supplied
pub async fn create(
    db: &DbConn,
    request: CreateInstitutionalIdRequest,
    added_by: i64,
) -> Result<institutional_id::Model> {
    let account_type = request.account_type.unwrap_or(AccountType::Student);

    let value = match non_empty(request.institutional_id) {
        Some(value) => {
            if exists(db, &value).await? {
                return Err(AppError::Conflict(format!(
                    "Institutional ID '{}' already exists",
                    value
                )));
            }
            value
        }
        None => generate_unique_id(db, account_type).await?,
    };

    let record = insert(
        db,
        NewInstitutionalId {
            value,
            account_type: Some(account_type),
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            academic_level: request.academic_level,
            department: request.department,
            expires_at: request.expires_at,
            notes: request.notes,
        },
        Some(added_by),
    )
    .await?;

    tracing::info!("Created institutional ID {}", record.institutional_id);
    Ok(record)
}

pub async fn get(db: &DbConn, id: i64) -> Result<institutional_id::Model> {
    InstitutionalId::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Institutional ID {} not found", id)))
}

/// List records, newest first
pub async fn list(db: &DbConn, query: &ListIdsQuery) -> Result<Vec<institutional_id::Model>> {
    let mut select = InstitutionalId::find();

    if let Some(status) = query.status {
        select = select.filter(institutional_id::Column::Status.eq(status.as_str()));
    }

    if let Some(account_type) = query.account_type {
        select = select.filter(institutional_id::Column::AccountType.eq(account_type.as_str()));
    }

    if let Some(search) = non_empty(query.search.clone()) {
        select = select.filter(
            Condition::any()
                .add(institutional_id::Column::InstitutionalId.contains(search.as_str()))
                .add(institutional_id::Column::FirstName.contains(search.as_str()))
                .add(institutional_id::Column::LastName.contains(search.as_str()))
                .add(institutional_id::Column::Email.contains(search.as_str()))
                .add(institutional_id::Column::Department.contains(search.as_str())),
        );
    }

    Ok(select
        .order_by_desc(institutional_id::Column::CreatedAt)
        .order_by_desc(institutional_id::Column::Id)
        .all(db)
        .await?)
}

pub async fn update(
    db: &DbConn,
    id: i64,
    request: UpdateInstitutionalIdRequest,
) -> Result<institutional_id::Model> {
    let existing = get(db, id).await?;
    let mut record: institutional_id::ActiveModel = existing.into();

    if let Some(first_name) = request.first_name {
        record.first_name = Set(non_empty(Some(first_name)));
    }
    if let Some(last_name) = request.last_name {
        record.last_name = Set(non_empty(Some(last_name)));
    }
    if let Some(email) = request.email {
        record.email = Set(non_empty(Some(email)));
    }
    if let Some(level) = request.academic_level {
        record.academic_level = Set(Some(level.to_string()));
    }
    if let Some(department) = request.department {
        record.department = Set(non_empty(Some(department)));
    }
    if let Some(expires_at) = request.expires_at {
        record.expires_at = Set(Some(expires_at));
    }
    if let Some(notes) = request.notes {
        record.notes = Set(non_empty(Some(notes)));
    }
    if let Some(status) = request.status {
        record.status = Set(status.to_string());
    }
    record.updated_at = Set(Utc::now());

    Ok(record.update(db).await?)
}

pub async fn delete(db: &DbConn, id: i64) -> Result<institutional_id::Model> {
    let existing = get(db, id).await?;
    InstitutionalId::delete_by_id(id).exec(db).await?;
    Ok(existing)
}

/// Apply an administrative status to many records at once
pub async fn set_status_bulk(db: &DbConn, ids: &[i64], status: IdStatus) -> Result<u64> {
    if status == IdStatus::Used {
        return Err(AppError::BadRequest(
            "Status 'used' is only set by registration".to_string(),
        ));
    }
    if ids.is_empty() {
        return Ok(0);
    }

    let result = InstitutionalId::update_many()
        .col_expr(
            institutional_id::Column::Status,
            Expr::value(status.as_str()),
        )
        .col_expr(institutional_id::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(institutional_id::Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Create `count` fresh active IDs in one transaction
pub async fn generate_bulk(
    db: &DbConn,
    request: &GenerateIdsRequest,
    added_by: Option<i64>,
) -> Result<Vec<institutional_id::Model>> {
    if request.count == 0 || request.count > MAX_GENERATE {
        return Err(AppError::Validation(format!(
            "count must be between 1 and {}",
            MAX_GENERATE
        )));
    }

    let account_type = request.account_type.unwrap_or(AccountType::Student);
    let txn = db.begin().await?;

    let mut created = Vec::with_capacity(request.count as usize);
    for _ in 0..request.count {
        let value = generate_unique_id(&txn, account_type).await?;
        let record = insert(
            &txn,
            NewInstitutionalId {
                value,
                account_type: Some(account_type),
                academic_level: request.academic_level,
                department: request.department.clone(),
                expires_at: request.expires_at,
                notes: request.notes.clone(),
                ..Default::default()
            },
            added_by,
        )
        .await?;
        created.push(record);
    }

    txn.commit().await?;

    tracing::info!("Generated {} {} institutional IDs", created.len(), account_type);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_db, seed_institutional_id};
    use chrono::Duration;

    #[test]
    fn test_candidate_format() {
        for _ in 0..200 {
            let student = candidate_id(AccountType::Student);
            assert_eq!(student.len(), 8);
            assert!(student.starts_with('2'));
            assert!(student.chars().all(|c| c.is_ascii_digit()));

            let staff = candidate_id(AccountType::Staff);
            assert_eq!(staff.len(), 8);
            assert!(staff.starts_with('3'));
        }
    }

    #[tokio::test]
    async fn test_verify_by_status() {
        let db = create_test_db().await;
        let now = Utc::now();
        seed_institutional_id(&db, "20000001", IdStatus::Active, None).await;
        seed_institutional_id(&db, "20000002", IdStatus::Used, None).await;
        seed_institutional_id(&db, "20000003", IdStatus::Expired, None).await;
        seed_institutional_id(&db, "20000004", IdStatus::Revoked, None).await;
        seed_institutional_id(&db, "20000005", IdStatus::Active, Some(now - Duration::days(1)))
            .await;

        assert!(verify(&db, " 20000001 ", now).await.is_ok());
        assert!(matches!(
            verify(&db, "29999999", now).await,
            Err(IdVerificationError::NotFound)
        ));
        assert!(matches!(
            verify(&db, "20000002", now).await,
            Err(IdVerificationError::AlreadyUsed)
        ));
        assert!(matches!(
            verify(&db, "20000003", now).await,
            Err(IdVerificationError::Expired)
        ));
        assert!(matches!(
            verify(&db, "20000004", now).await,
            Err(IdVerificationError::Revoked)
        ));
        assert!(matches!(
            verify(&db, "20000005", now).await,
            Err(IdVerificationError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_mark_used_only_once() {
        let db = create_test_db().await;
        let now = Utc::now();
        let record = seed_institutional_id(&db, "30000001", IdStatus::Active, None).await;

        mark_used(&db, &record, 1, now).await.unwrap();
        assert!(matches!(
            mark_used(&db, &record, 2, now).await,
            Err(IdVerificationError::AlreadyUsed)
        ));

        let stored = get(&db, record.id).await.unwrap();
        assert_eq!(stored.status, "used");
        assert_eq!(stored.used_by, Some(1));
        assert!(stored.used_at.is_some());
    }

    #[tokio::test]
    async fn test_bulk_status_rejects_used() {
        let db = create_test_db().await;
        let a = seed_institutional_id(&db, "20000010", IdStatus::Active, None).await;
        let b = seed_institutional_id(&db, "20000011", IdStatus::Active, None).await;

        assert!(set_status_bulk(&db, &[a.id], IdStatus::Used).await.is_err());
        let updated = set_status_bulk(&db, &[a.id, b.id], IdStatus::Revoked)
            .await
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(get(&db, b.id).await.unwrap().status, "revoked");
    }

    #[tokio::test]
    async fn test_verification_error_maps_to_app_error() {
        assert!(matches!(
            AppError::from(IdVerificationError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(IdVerificationError::AlreadyUsed),
            AppError::Unavailable(_)
        ));
    }
}
