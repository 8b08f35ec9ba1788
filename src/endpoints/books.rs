use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::middleware::{
    AdminOnly, Authenticated, Authorized, ClientMeta, MaybeAuthenticated, StaffOnly, StudentOnly,
};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::{book_review, category, recommendation};
use crate::schemas::book::{
    BookDetailResponse, BookListQuery, BookListResponse, CreateCategoryRequest, NewBook,
    OverviewResponse, RecommendRequest, ReviewRequest, UploadBookResponse, UploadedFile,
};
use crate::schemas::borrow::{BorrowRequestBody, BorrowResponse};
use crate::services::{borrow, catalog};
use crate::state::AppState;

/// Catalog routes. Anonymous visitors may browse; writes check roles per handler.
pub fn book_routes(state: AppState) -> Router {
    Router::new()
        .route("/overview", get(overview))
        .route("/books", get(list_books).post(upload_book))
        .route("/books/{id}", get(book_detail))
        .route("/books/{id}/borrow", post(request_borrow))
        .route("/books/{id}/reviews", post(review_book))
        .route("/books/{id}/recommend", post(recommend_book))
        .route("/categories", get(list_categories).post(create_category))
        .with_state(state)
}

// ============================================================================
// Browsing
// ============================================================================

async fn overview(State(state): State<AppState>) -> Result<Json<OverviewResponse>> {
    Ok(Json(catalog::overview(&state.db).await?))
}

async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<BookListResponse>> {
    let books = catalog::list_books(&state.db, &query, state.library.page_size).await?;
    Ok(Json(books))
}

async fn book_detail(
    State(state): State<AppState>,
    MaybeAuthenticated(viewer): MaybeAuthenticated,
    Path(id): Path<i64>,
) -> Result<Json<BookDetailResponse>> {
    let detail = catalog::book_detail(&state.db, id, viewer.as_ref()).await?;
    Ok(Json(detail))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<category::Model>>> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

// ============================================================================
// Catalog Management
// ============================================================================

async fn create_category(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<category::Model>)> {
    let created = catalog::create_category(&state.db, request).await?;

    state
        .audit
        .log_success(
            AuditAction::CategoryCreated,
            ResourceType::Category,
            Some(created.id.to_string()),
            Some(&admin),
            Some(serde_json::json!({ "name": created.name })),
            &client,
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

fn parse_category_id(value: &str) -> Result<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("Invalid category_id '{}'", value)))
}

/// Upload a book with its files (multipart form)
async fn upload_book(
    State(state): State<AppState>,
    Authorized(staff, _): Authorized<StaffOnly>,
    client: ClientMeta,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadBookResponse>)> {
    let mut new_book = NewBook::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => new_book.title = field.text().await?,
            "author" => new_book.author = field.text().await?,
            "description" => {
                new_book.description = Some(field.text().await?).filter(|d| !d.trim().is_empty())
            }
            "category_id" => new_book.category_id = parse_category_id(&field.text().await?)?,
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was chosen
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                files.push(UploadedFile {
                    file_name,
                    data: data.to_vec(),
                });
            }
            other => tracing::debug!("Ignoring unexpected upload field '{}'", other),
        }
    }

    let uploaded = catalog::upload_book(&state.db, &state.storage, &staff, new_book, files).await?;

    state
        .audit
        .log_success(
            AuditAction::BookUploaded,
            ResourceType::Book,
            Some(uploaded.book.id.to_string()),
            Some(&staff),
            Some(serde_json::json!({
                "title": uploaded.book.title,
                "files": uploaded.files.len(),
            })),
            &client,
        )
        .await;

    Ok((StatusCode::CREATED, Json(uploaded)))
}

// ============================================================================
// Reader Actions
// ============================================================================

async fn request_borrow(
    State(state): State<AppState>,
    Authorized(student, _): Authorized<StudentOnly>,
    client: ClientMeta,
    Path(id): Path<i64>,
    Json(body): Json<BorrowRequestBody>,
) -> Result<(StatusCode, Json<BorrowResponse>)> {
    let created = borrow::request_borrow(
        &state.db,
        &student,
        id,
        body.notes,
        body.due_date,
        state.library.loan_days,
    )
    .await?;

    state
        .audit
        .log_success(
            AuditAction::BorrowRequested,
            ResourceType::Borrow,
            Some(created.id.to_string()),
            Some(&student),
            Some(serde_json::json!({ "book_id": id })),
            &client,
        )
        .await;

    let described = borrow::describe(&state.db, vec![created]).await?;
    let response = described
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal("Borrow missing after creation".to_string()))?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn review_book(
    State(state): State<AppState>,
    Authenticated(reviewer): Authenticated,
    Path(id): Path<i64>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<book_review::Model>> {
    let review = catalog::upsert_review(&state.db, id, &reviewer, request).await?;
    Ok(Json(review))
}

async fn recommend_book(
    State(state): State<AppState>,
    Authorized(staff, _): Authorized<StaffOnly>,
    Path(id): Path<i64>,
    Json(request): Json<RecommendRequest>,
) -> Result<(StatusCode, Json<recommendation::Model>)> {
    let created = catalog::recommend(&state.db, id, &staff, request.message).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
