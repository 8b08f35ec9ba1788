//! Book catalog: search, detail, uploads, categories, reviews and
//! recommendations.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use validator::Validate;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{book, book_file, book_review, category, recommendation, user};
use crate::schemas::book::{
    BookDetailResponse, BookListItem, BookListQuery, BookListResponse, CreateCategoryRequest,
    NewBook, OverviewResponse, RecommendationResponse, ReviewRequest, ReviewResponse,
    UploadBookResponse, UploadedFile,
};
use crate::services::borrow::{has_approved_borrow, has_open_borrow};
use crate::services::storage::{MediaStorage, StoredFile};

const DETAIL_REVIEWS: u64 = 10;
const OVERVIEW_RECENT_BOOKS: u64 = 3;

pub async fn find_book(db: &DbConn, book_id: i64) -> Result<book::Model> {
    Book::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_id)))
}

fn average(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    sum as f64 / ratings.len() as f64
}

/// Average rating per book, 0 for books without reviews
pub async fn average_ratings(db: &DbConn, book_ids: &[i64]) -> Result<HashMap<i64, f64>> {
    let reviews = BookReview::find()
        .filter(book_review::Column::BookId.is_in(book_ids.iter().copied()))
        .all(db)
        .await?;

    let mut ratings: HashMap<i64, Vec<i32>> = HashMap::new();
    for review in reviews {
        ratings.entry(review.book_id).or_default().push(review.rating);
    }

    Ok(book_ids
        .iter()
        .map(|id| (*id, ratings.get(id).map(|r| average(r)).unwrap_or(0.0)))
        .collect())
}

async fn file_counts(db: &DbConn, book_ids: &[i64]) -> Result<HashMap<i64, usize>> {
    let files = BookFile::find()
        .filter(book_file::Column::BookId.is_in(book_ids.iter().copied()))
        .all(db)
        .await?;

    let mut counts = HashMap::new();
    for file in files {
        *counts.entry(file.book_id).or_insert(0) += 1;
    }
    Ok(counts)
}

fn lower_like(column: book::Column, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((book::Entity, column)))).like(format!("%{}%", needle))
}

/// Paged catalog listing, newest first
pub async fn list_books(
    db: &DbConn,
    query: &BookListQuery,
    page_size: u64,
) -> Result<BookListResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let search = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut select = Book::find();

    if let Some(needle) = &search {
        select = select.filter(
            Condition::any()
                .add(lower_like(book::Column::Title, needle))
                .add(lower_like(book::Column::Author, needle))
                .add(lower_like(book::Column::Description, needle)),
        );
    }

    if let Some(category_id) = query.category {
        select = select.filter(book::Column::CategoryId.eq(category_id));
    }

    let paginator = select
        .order_by_desc(book::Column::CreatedAt)
        .order_by_desc(book::Column::Id)
        .paginate(db, page_size.max(1));

    let total = paginator.num_items().await?;
    let total_pages = paginator.num_pages().await?;
    let books = paginator.fetch_page(page - 1).await?;

    let ids: Vec<i64> = books.iter().map(|b| b.id).collect();
    let ratings = average_ratings(db, &ids).await?;
    let counts = file_counts(db, &ids).await?;

    let books = books
        .into_iter()
        .map(|b| {
            let avg = ratings.get(&b.id).copied().unwrap_or(0.0);
            let count = counts.get(&b.id).copied().unwrap_or(0);
            BookListItem::new(b, avg, count)
        })
        .collect();

    Ok(BookListResponse {
        books,
        total,
        page,
        total_pages,
        query: search,
        category: query.category,
    })
}

/// Book detail including the caller's borrow and access flags
pub async fn book_detail(
    db: &DbConn,
    book_id: i64,
    viewer: Option<&user::Model>,
) -> Result<BookDetailResponse> {
    let found = find_book(db, book_id).await?;

    let category = match found.category_id {
        Some(id) => Category::find_by_id(id).one(db).await?,
        None => None,
    };

    let files = BookFile::find()
        .filter(book_file::Column::BookId.eq(book_id))
        .order_by_asc(book_file::Column::Id)
        .all(db)
        .await?;

    let reviews = BookReview::find()
        .filter(book_review::Column::BookId.eq(book_id))
        .order_by_desc(book_review::Column::CreatedAt)
        .order_by_desc(book_review::Column::Id)
        .find_also_related(User)
        .limit(DETAIL_REVIEWS)
        .all(db)
        .await?;

    let avg_rating = average_ratings(db, &[book_id])
        .await?
        .get(&book_id)
        .copied()
        .unwrap_or(0.0);

    let (can_borrow, has_approved_access, is_staff_access) = match viewer {
        Some(u) if u.is_staff_member() => (false, true, true),
        Some(u) if u.student => (
            !has_open_borrow(db, book_id, u.id).await?,
            has_approved_borrow(db, book_id, u.id).await?,
            false,
        ),
        _ => (false, false, false),
    };

    Ok(BookDetailResponse {
        book: found,
        category,
        files,
        reviews: reviews
            .into_iter()
            .map(|(review, reviewer)| ReviewResponse::new(review, reviewer.map(|u| u.username)))
            .collect(),
        avg_rating,
        can_borrow,
        has_approved_access,
        is_staff_access,
    })
}

/// Store a new book and its files.
///
/// Every file name is checked before anything is written; files already on
/// disk are removed again when the database insert fails.
pub async fn upload_book(
    db: &DbConn,
    storage: &MediaStorage,
    uploader: &user::Model,
    new_book: NewBook,
    files: Vec<UploadedFile>,
) -> Result<UploadBookResponse> {
    new_book.validate()?;
    for file in &files {
        MediaStorage::check_extension(&file.file_name)?;
    }

    if let Some(category_id) = new_book.category_id {
        Category::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Category {} does not exist", category_id)))?;
    }

    let mut stored: Vec<StoredFile> = Vec::with_capacity(files.len());
    for file in &files {
        match storage.save_book_file(&file.file_name, &file.data).await {
            Ok(s) => stored.push(s),
            Err(e) => {
                discard(storage, &stored).await;
                return Err(e);
            }
        }
    }

    match insert_book(db, uploader, new_book, &stored).await {
        Ok(response) => {
            tracing::info!(
                "User {} uploaded book {} with {} files",
                uploader.username,
                response.book.id,
                response.files.len()
            );
            Ok(response)
        }
        Err(e) => {
            discard(storage, &stored).await;
            Err(e)
        }
    }
}

async fn discard(storage: &MediaStorage, stored: &[StoredFile]) {
    for file in stored {
        storage.remove(&file.stored_path).await;
    }
}

async fn insert_book(
    db: &DbConn,
    uploader: &user::Model,
    new_book: NewBook,
    stored: &[StoredFile],
) -> Result<UploadBookResponse> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let created = book::ActiveModel {
        title: Set(new_book.title.trim().to_string()),
        author: Set(new_book.author.trim().to_string()),
        description: Set(new_book.description.filter(|d| !d.trim().is_empty())),
        category_id: Set(new_book.category_id),
        uploaded_by: Set(Some(uploader.id)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut files = Vec::with_capacity(stored.len());
    for file in stored {
        let row = book_file::ActiveModel {
            book_id: Set(created.id),
            file_name: Set(file.file_name.clone()),
            stored_path: Set(file.stored_path.clone()),
            file_size: Set(Some(file.file_size)),
            uploaded_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        files.push(row);
    }

    txn.commit().await?;

    Ok(UploadBookResponse {
        book: created,
        files,
    })
}

pub async fn list_categories(db: &DbConn) -> Result<Vec<category::Model>> {
    Ok(Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?)
}

pub async fn create_category(db: &DbConn, request: CreateCategoryRequest) -> Result<category::Model> {
    request.validate()?;
    let name = request.name.trim().to_string();

    let existing = Category::find()
        .filter(category::Column::Name.eq(name.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Category '{}' already exists",
            name
        )));
    }

    Ok(category::ActiveModel {
        name: Set(name),
        description: Set(request.description.filter(|d| !d.trim().is_empty())),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Create or replace the caller's review of a book
pub async fn upsert_review(
    db: &DbConn,
    book_id: i64,
    reviewer: &user::Model,
    request: ReviewRequest,
) -> Result<book_review::Model> {
    request.validate()?;
    find_book(db, book_id).await?;

    let now = Utc::now();
    let existing = BookReview::find()
        .filter(book_review::Column::BookId.eq(book_id))
        .filter(book_review::Column::ReviewerId.eq(reviewer.id))
        .one(db)
        .await?;

    let review = match existing {
        Some(existing) => {
            let mut review: book_review::ActiveModel = existing.into();
            review.rating = Set(request.rating);
            review.comment = Set(request.comment);
            review.updated_at = Set(now);
            review.update(db).await?
        }
        None => {
            book_review::ActiveModel {
                book_id: Set(book_id),
                reviewer_id: Set(reviewer.id),
                rating: Set(request.rating),
                comment: Set(request.comment),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    Ok(review)
}

pub async fn recommend(
    db: &DbConn,
    book_id: i64,
    staff: &user::Model,
    message: Option<String>,
) -> Result<recommendation::Model> {
    find_book(db, book_id).await?;

    Ok(recommendation::ActiveModel {
        book_id: Set(book_id),
        recommended_by: Set(staff.id),
        message: Set(message.filter(|m| !m.trim().is_empty())),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn latest_recommendations(db: &DbConn, limit: u64) -> Result<Vec<RecommendationResponse>> {
    let rows = Recommendation::find()
        .order_by_desc(recommendation::Column::CreatedAt)
        .order_by_desc(recommendation::Column::Id)
        .find_also_related(Book)
        .limit(limit)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(rec, b)| RecommendationResponse::new(rec, b.map(|b| b.title)))
        .collect())
}

pub async fn recent_books(db: &DbConn, limit: u64) -> Result<Vec<book::Model>> {
    Ok(Book::find()
        .order_by_desc(book::Column::CreatedAt)
        .order_by_desc(book::Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

/// Public landing page figures
pub async fn overview(db: &DbConn) -> Result<OverviewResponse> {
    Ok(OverviewResponse {
        total_books: Book::find().count(db).await?,
        total_users: User::find().count(db).await?,
        total_downloads: BookDownload::find().count(db).await?,
        total_categories: Category::find().count(db).await?,
        recent_books: recent_books(db, OVERVIEW_RECENT_BOOKS).await?,
    })
}
