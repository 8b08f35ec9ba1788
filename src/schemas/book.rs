use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{book, book_file, book_review, category, recommendation};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookListQuery {
    /// Case-insensitive match on title, author or description
    pub query: Option<String>,
    /// Category id
    pub category: Option<i64>,
    pub page: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookListItem {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub avg_rating: f64,
    pub file_count: usize,
}

impl BookListItem {
    pub fn new(book: book::Model, avg_rating: f64, file_count: usize) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            category_id: book.category_id,
            created_at: book.created_at,
            avg_rating,
            file_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookListResponse {
    pub books: Vec<BookListItem>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub query: Option<String>,
    pub category: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub reviewer_id: i64,
    pub reviewer: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewResponse {
    pub fn new(review: book_review::Model, reviewer: Option<String>) -> Self {
        Self {
            id: review.id,
            reviewer_id: review.reviewer_id,
            reviewer,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetailResponse {
    pub book: book::Model,
    pub category: Option<category::Model>,
    pub files: Vec<book_file::Model>,
    pub reviews: Vec<ReviewResponse>,
    pub avg_rating: f64,
    pub can_borrow: bool,
    pub has_approved_access: bool,
    pub is_staff_access: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub id: i64,
    pub book_id: i64,
    pub book_title: Option<String>,
    pub recommended_by: i64,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RecommendationResponse {
    pub fn new(rec: recommendation::Model, book_title: Option<String>) -> Self {
        Self {
            id: rec.id,
            book_id: rec.book_id,
            book_title,
            recommended_by: rec.recommended_by,
            message: rec.message,
            created_at: rec.created_at,
        }
    }
}

/// Metadata fields of a book upload
#[derive(Debug, Clone, Default, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub author: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// A file part of a book upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadBookResponse {
    pub book: book::Model,
    pub files: Vec<book_file::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewResponse {
    pub total_books: u64,
    pub total_users: u64,
    pub total_downloads: u64,
    pub total_categories: u64,
    pub recent_books: Vec<book::Model>,
}
