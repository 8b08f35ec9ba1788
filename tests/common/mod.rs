//! Test helpers and utilities for integration testing.
//!
//! Builds an in-memory database, an `AppState` backed by a temporary media
//! root, and small request/response helpers for driving the router.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;
use tower::util::ServiceExt;

use academialink::config::library::LibraryConfig;
use academialink::endpoints::create_router;
use academialink::migrations::Migrator;
use academialink::models::institutional_id::{self, AccountType, IdStatus};
use academialink::models::{book, book_file, category, user};
use academialink::services::security::{create_session_token, hash_password};
use academialink::services::MediaStorage;
use academialink::state::AppState;

pub const BOUNDARY: &str = "academialink-test-boundary";
pub const PASSWORD: &str = "library-pass-1";

// bcrypt is slow in debug builds; hash once per test binary
static PASSWORD_HASH: Lazy<String> = Lazy::new(|| hash_password(PASSWORD).unwrap());

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

/// Shared state plus the temp dir that must outlive it
pub struct TestApp {
    pub state: AppState,
    pub media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = create_test_db().await;
        let media = TempDir::new().expect("Failed to create media dir");
        let state = AppState::new(db, MediaStorage::new(media.path()), LibraryConfig::default());
        Self { state, media }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Send a request through a fresh router and decode the JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    /// Send a request and return the raw response
    pub async fn send_raw(&self, request: Request<Body>) -> axum::response::Response {
        self.router().oneshot(request).await.unwrap()
    }
}

pub fn bearer(user: &user::Model) -> String {
    let token = create_session_token(user.id, None).expect("Failed to create token");
    format!("Bearer {}", token)
}

pub fn get(uri: &str, user: Option<&user::Model>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(user) = user {
        builder = builder.header("authorization", bearer(user));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    user: Option<&user::Model>,
    payload: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("authorization", bearer(user));
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

pub fn post_json(uri: &str, user: Option<&user::Model>, payload: serde_json::Value) -> Request<Body> {
    json_request("POST", uri, user, payload)
}

/// A part of a multipart form: (field name, optional file name, contents)
pub type Part<'a> = (&'a str, Option<&'a str>, &'a str);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn post_multipart(uri: &str, user: &user::Model, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("authorization", bearer(user))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Student,
    Staff,
    Admin,
}

/// Insert an active user with `PASSWORD`
pub async fn seed_user(db: &DatabaseConnection, username: &str, kind: Kind) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@uni.edu", username)),
        hashed_password: Set(PASSWORD_HASH.clone()),
        first_name: Set(username.to_string()),
        last_name: Set("Tester".to_string()),
        is_active: Set(true),
        is_superuser: Set(matches!(kind, Kind::Admin)),
        student: Set(matches!(kind, Kind::Student)),
        staff: Set(matches!(kind, Kind::Staff | Kind::Admin)),
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
    .await
    .expect("Failed to seed user")
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
        first_name: Set(Some("Ada".to_string())),
        last_name: Set(Some("Lovelace".to_string())),
        email: Set(Some(format!("{}@uni.edu", value))),
        academic_level: Set(None),
        department: Set(Some("Mathematics".to_string())),
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

pub async fn seed_category(db: &DatabaseConnection, name: &str) -> category::Model {
    category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed category")
}

/// Insert a book with one stored file
pub async fn seed_book(
    app: &TestApp,
    title: &str,
    category_id: Option<i64>,
    file_name: &str,
    contents: &[u8],
) -> (book::Model, book_file::Model) {
    let created = book::ActiveModel {
        title: Set(title.to_string()),
        author: Set("Jane Author".to_string()),
        description: Set(None),
        category_id: Set(category_id),
        uploaded_by: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(app.db())
    .await
    .expect("Failed to seed book");

    let stored = app
        .state
        .storage
        .save_book_file(file_name, contents)
        .await
        .expect("Failed to store book file");

    let file = book_file::ActiveModel {
        book_id: Set(created.id),
        file_name: Set(stored.file_name),
        stored_path: Set(stored.stored_path),
        file_size: Set(Some(stored.file_size)),
        uploaded_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(app.db())
    .await
    .expect("Failed to seed book file");

    (created, file)
}
