use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::book_borrow::{self, BorrowStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BorrowRequestBody {
    pub notes: Option<String>,
    /// Defaults to the configured loan period
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BorrowListQuery {
    pub status: Option<BorrowStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BorrowResponse {
    pub id: i64,
    pub book_id: i64,
    pub book_title: Option<String>,
    pub borrower_id: i64,
    pub borrower: Option<String>,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub is_overdue: bool,
    pub notes: Option<String>,
    pub approved_by: Option<i64>,
}

impl BorrowResponse {
    pub fn new(borrow: book_borrow::Model, book_title: Option<String>, borrower: Option<String>) -> Self {
        Self {
            is_overdue: borrow.is_overdue(),
            id: borrow.id,
            book_id: borrow.book_id,
            book_title,
            borrower_id: borrow.borrower_id,
            borrower,
            borrowed_date: borrow.borrowed_date,
            due_date: borrow.due_date,
            return_date: borrow.return_date,
            status: borrow.status,
            notes: borrow.notes,
            approved_by: borrow.approved_by,
        }
    }
}

impl From<book_borrow::Model> for BorrowResponse {
    fn from(borrow: book_borrow::Model) -> Self {
        Self::new(borrow, None, None)
    }
}
