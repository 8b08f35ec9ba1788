use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::middleware::{Authenticated, Authorized, ClientMeta, StaffOnly};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::book_borrow;
use crate::models::user;
use crate::schemas::borrow::{BorrowListQuery, BorrowResponse};
use crate::services::borrow;
use crate::state::AppState;

pub fn borrow_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_borrows))
        .route("/{id}/approve", post(approve_borrow))
        .route("/{id}/reject", post(reject_borrow))
        .route("/{id}/return", post(return_borrow))
        .with_state(state)
}

async fn respond(
    state: &AppState,
    updated: book_borrow::Model,
    actor: &user::Model,
    action: AuditAction,
    client: &ClientMeta,
) -> Result<Json<BorrowResponse>> {
    state
        .audit
        .log_success(
            action,
            ResourceType::Borrow,
            Some(updated.id.to_string()),
            Some(actor),
            Some(serde_json::json!({ "book_id": updated.book_id, "status": updated.status })),
            client,
        )
        .await;

    borrow::describe(&state.db, vec![updated])
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::Internal("Borrow missing after update".to_string()))
}

/// All borrow requests for staff review, newest first
async fn list_borrows(
    State(state): State<AppState>,
    _auth: Authorized<StaffOnly>,
    Query(query): Query<BorrowListQuery>,
) -> Result<Json<Vec<BorrowResponse>>> {
    let borrows = borrow::list_borrows(&state.db, query.status).await?;
    Ok(Json(borrow::describe(&state.db, borrows).await?))
}

async fn approve_borrow(
    State(state): State<AppState>,
    Authorized(staff, _): Authorized<StaffOnly>,
    client: ClientMeta,
    Path(id): Path<i64>,
) -> Result<Json<BorrowResponse>> {
    let updated = borrow::approve(&state.db, id, &staff).await?;
    respond(&state, updated, &staff, AuditAction::BorrowApproved, &client).await
}

async fn reject_borrow(
    State(state): State<AppState>,
    Authorized(staff, _): Authorized<StaffOnly>,
    client: ClientMeta,
    Path(id): Path<i64>,
) -> Result<Json<BorrowResponse>> {
    let updated = borrow::reject(&state.db, id, &staff).await?;
    respond(&state, updated, &staff, AuditAction::BorrowRejected, &client).await
}

/// Borrower hands the book back
async fn return_borrow(
    State(state): State<AppState>,
    Authenticated(borrower): Authenticated,
    client: ClientMeta,
    Path(id): Path<i64>,
) -> Result<Json<BorrowResponse>> {
    let updated = borrow::return_borrow(&state.db, id, &borrower).await?;
    respond(&state, updated, &borrower, AuditAction::BorrowReturned, &client).await
}
