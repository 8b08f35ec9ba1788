use chrono::{DateTime, Utc};
use serde::Serialize;

use super::book::RecommendationResponse;
use super::borrow::BorrowResponse;
use crate::models::book;

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub borrows: Vec<BorrowResponse>,
    pub overdue: Vec<BorrowResponse>,
    pub recent_books: Vec<book::Model>,
    pub recommendations: Vec<RecommendationResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffDashboard {
    pub pending_borrows: Vec<BorrowResponse>,
    pub recent_borrows: Vec<BorrowResponse>,
    pub total_books: u64,
    pub total_borrows: u64,
    pub recent_books: Vec<book::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsersByRole {
    pub students: u64,
    pub staff: u64,
    pub admins: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryCount {
    /// `None` groups uncategorised books
    pub category: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookDownloadCount {
    pub book_id: i64,
    pub title: String,
    pub downloads: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadEvent {
    pub id: i64,
    pub file_id: i64,
    pub file_name: Option<String>,
    pub user_id: i64,
    pub username: Option<String>,
    pub downloaded_at: DateTime<Utc>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse {
    pub total_books: u64,
    pub total_users: u64,
    pub total_downloads: u64,
    pub total_borrows: u64,
    pub active_borrows: u64,
    pub pending_borrows: u64,
    pub users_by_role: UsersByRole,
    pub top_categories: Vec<CategoryCount>,
    pub downloads_last_30_days: u64,
    pub top_downloaded_books: Vec<BookDownloadCount>,
    pub recent_downloads: Vec<DownloadEvent>,
    pub recent_borrows: Vec<BorrowResponse>,
}
