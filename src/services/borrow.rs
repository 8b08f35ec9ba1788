//! Borrow lifecycle: `pending -> approved | rejected`, `approved -> returned`.
//!
//! Every status change goes through [`transition`]; "overdue" is derived from
//! the due date and never written.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::book_borrow::{self, BorrowStatus};
use crate::models::prelude::*;
use crate::models::{book, user};
use crate::schemas::borrow::BorrowResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowAction {
    Approve,
    Reject,
    Return,
}

impl fmt::Display for BorrowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorrowAction::Approve => write!(f, "approve"),
            BorrowAction::Reject => write!(f, "reject"),
            BorrowAction::Return => write!(f, "return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} a borrow that is {from}")]
    InvalidTransition { from: String, action: BorrowAction },
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidTransition(err.to_string())
    }
}

/// The only legal status changes
pub fn transition(
    from: BorrowStatus,
    action: BorrowAction,
) -> std::result::Result<BorrowStatus, TransitionError> {
    match (from, action) {
        (BorrowStatus::Pending, BorrowAction::Approve) => Ok(BorrowStatus::Approved),
        (BorrowStatus::Pending, BorrowAction::Reject) => Ok(BorrowStatus::Rejected),
        (BorrowStatus::Approved, BorrowAction::Return) => Ok(BorrowStatus::Returned),
        (from, action) => Err(TransitionError::InvalidTransition {
            from: from.to_string(),
            action,
        }),
    }
}

pub fn default_due_date(created: DateTime<Utc>, loan_days: i64) -> DateTime<Utc> {
    created + Duration::days(loan_days)
}

async fn find_borrow<C: ConnectionTrait>(conn: &C, borrow_id: i64) -> Result<book_borrow::Model> {
    BookBorrow::find_by_id(borrow_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow {} not found", borrow_id)))
}

/// True when the student holds an approved borrow of the book
pub async fn has_approved_borrow<C: ConnectionTrait>(
    conn: &C,
    book_id: i64,
    borrower_id: i64,
) -> Result<bool> {
    Ok(BookBorrow::find()
        .filter(book_borrow::Column::BookId.eq(book_id))
        .filter(book_borrow::Column::BorrowerId.eq(borrower_id))
        .filter(book_borrow::Column::Status.eq(BorrowStatus::Approved.as_str()))
        .one(conn)
        .await?
        .is_some())
}

/// True when the student already has a pending or approved borrow of the book
pub async fn has_open_borrow<C: ConnectionTrait>(
    conn: &C,
    book_id: i64,
    borrower_id: i64,
) -> Result<bool> {
    Ok(BookBorrow::find()
        .filter(book_borrow::Column::BookId.eq(book_id))
        .filter(book_borrow::Column::BorrowerId.eq(borrower_id))
        .filter(book_borrow::Column::Status.is_in([
            BorrowStatus::Pending.as_str(),
            BorrowStatus::Approved.as_str(),
        ]))
        .one(conn)
        .await?
        .is_some())
}

/// Open a pending borrow request for a student
pub async fn request_borrow(
    db: &DbConn,
    student: &user::Model,
    book_id: i64,
    notes: Option<String>,
    due_date: Option<DateTime<Utc>>,
    loan_days: i64,
) -> Result<book_borrow::Model> {
    if !student.student {
        return Err(AppError::Forbidden(
            "Only students can request to borrow books".to_string(),
        ));
    }

    let txn = db.begin().await?;

    Book::find_by_id(book_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_id)))?;

    if has_open_borrow(&txn, book_id, student.id).await? {
        return Err(AppError::Conflict(
            "You already have a pending or approved request for this book".to_string(),
        ));
    }

    let now = Utc::now();
    let borrow = book_borrow::ActiveModel {
        book_id: Set(book_id),
        borrower_id: Set(student.id),
        borrowed_date: Set(now),
        due_date: Set(due_date.unwrap_or_else(|| default_due_date(now, loan_days))),
        return_date: Set(None),
        status: Set(BorrowStatus::Pending.to_string()),
        notes: Set(notes.filter(|n| !n.trim().is_empty())),
        approved_by: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!("User {} requested book {}", student.username, book_id);
    Ok(borrow)
}

async fn apply(
    db: &DbConn,
    borrow_id: i64,
    actor: &user::Model,
    action: BorrowAction,
) -> Result<book_borrow::Model> {
    let txn = db.begin().await?;

    // Re-read inside the transaction so the check sees the current status
    let current = find_borrow(&txn, borrow_id).await?;

    match action {
        BorrowAction::Approve | BorrowAction::Reject if !actor.is_staff_member() => {
            return Err(AppError::Forbidden("Staff access required".to_string()));
        }
        BorrowAction::Return if current.borrower_id != actor.id => {
            return Err(AppError::Forbidden(
                "Only the borrower can return this book".to_string(),
            ));
        }
        _ => {}
    }

    let from = current.parsed_status().ok_or_else(|| {
        AppError::Internal(format!(
            "Borrow {} has unknown status '{}'",
            current.id, current.status
        ))
    })?;
    let to = transition(from, action)?;

    let now = Utc::now();
    let mut borrow: book_borrow::ActiveModel = current.into();
    borrow.status = Set(to.to_string());
    match action {
        BorrowAction::Approve | BorrowAction::Reject => borrow.approved_by = Set(Some(actor.id)),
        BorrowAction::Return => borrow.return_date = Set(Some(now)),
    }
    let updated = borrow.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        "Borrow {} {}: {} -> {} by {}",
        borrow_id,
        action,
        from,
        to,
        actor.username
    );
    Ok(updated)
}

/// Attach book titles and borrower usernames for display
pub async fn describe(db: &DbConn, borrows: Vec<book_borrow::Model>) -> Result<Vec<BorrowResponse>> {
    let book_ids: Vec<i64> = borrows.iter().map(|b| b.book_id).collect();
    let user_ids: Vec<i64> = borrows.iter().map(|b| b.borrower_id).collect();

    let titles: HashMap<i64, String> = Book::find()
        .filter(book::Column::Id.is_in(book_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b.title))
        .collect();
    let usernames: HashMap<i64, String> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    Ok(borrows
        .into_iter()
        .map(|b| {
            let title = titles.get(&b.book_id).cloned();
            let borrower = usernames.get(&b.borrower_id).cloned();
            BorrowResponse::new(b, title, borrower)
        })
        .collect())
}

/// All borrows, newest first, optionally limited to one status
pub async fn list_borrows(
    db: &DbConn,
    status: Option<BorrowStatus>,
) -> Result<Vec<book_borrow::Model>> {
    let mut select = BookBorrow::find();
    match status {
        // Derived: approved, past the due date and not returned
        Some(BorrowStatus::Overdue) => {
            select = select
                .filter(book_borrow::Column::Status.eq(BorrowStatus::Approved.as_str()))
                .filter(book_borrow::Column::DueDate.lt(Utc::now()))
                .filter(book_borrow::Column::ReturnDate.is_null());
        }
        Some(status) => {
            select = select.filter(book_borrow::Column::Status.eq(status.as_str()));
        }
        None => {}
    }

    Ok(select
        .order_by_desc(book_borrow::Column::BorrowedDate)
        .order_by_desc(book_borrow::Column::Id)
        .all(db)
        .await?)
}

pub async fn approve(db: &DbConn, borrow_id: i64, staff: &user::Model) -> Result<book_borrow::Model> {
    apply(db, borrow_id, staff, BorrowAction::Approve).await
}

pub async fn reject(db: &DbConn, borrow_id: i64, staff: &user::Model) -> Result<book_borrow::Model> {
    apply(db, borrow_id, staff, BorrowAction::Reject).await
}

pub async fn return_borrow(
    db: &DbConn,
    borrow_id: i64,
    borrower: &user::Model,
) -> Result<book_borrow::Model> {
    apply(db, borrow_id, borrower, BorrowAction::Return).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALL: [BorrowStatus; 5] = [
        BorrowStatus::Pending,
        BorrowStatus::Approved,
        BorrowStatus::Rejected,
        BorrowStatus::Returned,
        BorrowStatus::Overdue,
    ];

    #[test]
    fn test_only_three_transitions_are_legal() {
        let mut legal = Vec::new();
        for from in ALL {
            for action in [BorrowAction::Approve, BorrowAction::Reject, BorrowAction::Return] {
                if let Ok(to) = transition(from, action) {
                    legal.push((from, action, to));
                }
            }
        }

        assert_eq!(
            legal,
            vec![
                (BorrowStatus::Pending, BorrowAction::Approve, BorrowStatus::Approved),
                (BorrowStatus::Pending, BorrowAction::Reject, BorrowStatus::Rejected),
                (BorrowStatus::Approved, BorrowAction::Return, BorrowStatus::Returned),
            ]
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = transition(BorrowStatus::Returned, BorrowAction::Approve).unwrap_err();
        assert_eq!(err.to_string(), "cannot approve a borrow that is returned");
        assert!(matches!(AppError::from(err), AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_default_due_date_is_fourteen_days() {
        let created = Utc.with_ymd_and_hms(2026, 2, 20, 9, 30, 0).unwrap();
        let due = default_due_date(created, crate::config::library::DEFAULT_LOAN_DAYS);
        assert_eq!(due, Utc.with_ymd_and_hms(2026, 3, 6, 9, 30, 0).unwrap());
    }
}
