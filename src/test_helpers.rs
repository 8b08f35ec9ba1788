//! Test helpers and utilities for unit testing.
//!
//! Provides an in-memory database and small fixtures for institutional IDs
//! and users.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;
use crate::models::institutional_id::{self, AccountType, IdStatus};
use crate::models::user;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Insert an institutional ID; values starting with '3' are staff IDs
pub async fn seed_institutional_id(
    db: &DatabaseConnection,
    value: &str,
    status: IdStatus,
    expires_at: Option<DateTime<Utc>>,
) -> institutional_id::Model {
    let account_type = if value.starts_with('3') {
        AccountType::Staff
    } else {
        AccountType::Student
    };
    let now = Utc::now();

    institutional_id::ActiveModel {
        institutional_id: Set(value.to_string()),
        account_type: Set(account_type.to_string()),
        status: Set(status.to_string()),
        first_name: Set(None),
        last_name: Set(None),
        email: Set(None),
        academic_level: Set(None),
        department: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        expires_at: Set(expires_at),
        used_at: Set(None),
        used_by: Set(None),
        added_by: Set(None),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed institutional ID")
}

/// Build an unsaved user with the given role flags
pub fn user_model(student: bool, staff: bool, superuser: bool) -> user::Model {
    let now = Utc::now();
    user::Model {
        id: 1,
        username: "tester".to_string(),
        email: "tester@uni.edu".to_string(),
        hashed_password: String::new(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        is_active: true,
        is_superuser: superuser,
        student,
        staff,
        academic_level: None,
        phone_number: None,
        address: None,
        date_of_birth: None,
        institutional_id_ref: None,
        created_at: now,
        updated_at: now,
        last_login: None,
    }
}
