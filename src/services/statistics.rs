//! Dashboards and library usage statistics.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::db::DbConn;
use crate::error::Result;
use crate::models::book_borrow::BorrowStatus;
use crate::models::prelude::*;
use crate::models::{book, book_borrow, book_download, book_file, category, user};
use crate::schemas::statistics::{
    BookDownloadCount, CategoryCount, DownloadEvent, StaffDashboard, StatisticsResponse,
    StudentDashboard, UsersByRole,
};
use crate::services::{borrow, catalog};

const STUDENT_RECENT_BOOKS: u64 = 5;
const STUDENT_RECOMMENDATIONS: u64 = 5;
const STAFF_RECENT_BORROWS: u64 = 10;
const STAFF_RECENT_BOOKS: u64 = 12;
const TOP_LIMIT: usize = 5;
const RECENT_ACTIVITY: u64 = 10;
const DOWNLOAD_WINDOW_DAYS: i64 = 30;

pub async fn student_dashboard(db: &DbConn, student: &user::Model) -> Result<StudentDashboard> {
    let own = BookBorrow::find()
        .filter(book_borrow::Column::BorrowerId.eq(student.id))
        .order_by_desc(book_borrow::Column::BorrowedDate)
        .order_by_desc(book_borrow::Column::Id)
        .all(db)
        .await?;

    let borrows = borrow::describe(db, own).await?;
    let overdue = borrows.iter().filter(|b| b.is_overdue).cloned().collect();

    Ok(StudentDashboard {
        borrows,
        overdue,
        recent_books: catalog::recent_books(db, STUDENT_RECENT_BOOKS).await?,
        recommendations: catalog::latest_recommendations(db, STUDENT_RECOMMENDATIONS).await?,
    })
}

pub async fn staff_dashboard(db: &DbConn) -> Result<StaffDashboard> {
    let pending = BookBorrow::find()
        .filter(book_borrow::Column::Status.eq(BorrowStatus::Pending.as_str()))
        .order_by_asc(book_borrow::Column::BorrowedDate)
        .all(db)
        .await?;

    let recent = BookBorrow::find()
        .order_by_desc(book_borrow::Column::BorrowedDate)
        .order_by_desc(book_borrow::Column::Id)
        .limit(STAFF_RECENT_BORROWS)
        .all(db)
        .await?;

    Ok(StaffDashboard {
        pending_borrows: borrow::describe(db, pending).await?,
        recent_borrows: borrow::describe(db, recent).await?,
        total_books: Book::find().count(db).await?,
        total_borrows: BookBorrow::find().count(db).await?,
        recent_books: catalog::recent_books(db, STAFF_RECENT_BOOKS).await?,
    })
}

async fn top_categories(db: &DbConn) -> Result<Vec<CategoryCount>> {
    let grouped: Vec<(Option<i64>, i64)> = Book::find()
        .select_only()
        .column(book::Column::CategoryId)
        .column_as(Expr::col(book::Column::Id).count(), "count")
        .group_by(book::Column::CategoryId)
        .into_tuple()
        .all(db)
        .await?;

    let names: HashMap<i64, String> = Category::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c: category::Model| (c.id, c.name))
        .collect();

    let mut counts: Vec<CategoryCount> = grouped
        .into_iter()
        .map(|(category_id, count)| CategoryCount {
            category: category_id.and_then(|id| names.get(&id).cloned()),
            count: count as u64,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    counts.truncate(TOP_LIMIT);
    Ok(counts)
}

async fn top_downloaded_books(db: &DbConn) -> Result<Vec<BookDownloadCount>> {
    let per_file: Vec<(i64, i64)> = BookDownload::find()
        .select_only()
        .column(book_download::Column::BookFileId)
        .column_as(Expr::col(book_download::Column::Id).count(), "count")
        .group_by(book_download::Column::BookFileId)
        .into_tuple()
        .all(db)
        .await?;

    let file_ids: Vec<i64> = per_file.iter().map(|(id, _)| *id).collect();
    let file_books: HashMap<i64, i64> = BookFile::find()
        .filter(book_file::Column::Id.is_in(file_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|f| (f.id, f.book_id))
        .collect();

    let mut per_book: HashMap<i64, u64> = HashMap::new();
    for (file_id, count) in per_file {
        if let Some(book_id) = file_books.get(&file_id) {
            *per_book.entry(*book_id).or_insert(0) += count as u64;
        }
    }

    let titles: HashMap<i64, String> = Book::find()
        .filter(book::Column::Id.is_in(per_book.keys().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b.title))
        .collect();

    let mut books: Vec<BookDownloadCount> = per_book
        .into_iter()
        .filter(|(_, downloads)| *downloads > 0)
        .filter_map(|(book_id, downloads)| {
            titles.get(&book_id).map(|title| BookDownloadCount {
                book_id,
                title: title.clone(),
                downloads,
            })
        })
        .collect();
    books.sort_by(|a, b| b.downloads.cmp(&a.downloads).then_with(|| a.book_id.cmp(&b.book_id)));
    books.truncate(TOP_LIMIT);
    Ok(books)
}

async fn recent_downloads(db: &DbConn) -> Result<Vec<DownloadEvent>> {
    let rows = BookDownload::find()
        .order_by_desc(book_download::Column::DownloadedAt)
        .order_by_desc(book_download::Column::Id)
        .find_also_related(BookFile)
        .limit(RECENT_ACTIVITY)
        .all(db)
        .await?;

    let user_ids: Vec<i64> = rows.iter().map(|(d, _)| d.user_id).collect();
    let usernames: HashMap<i64, String> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    Ok(rows
        .into_iter()
        .map(|(download, file)| DownloadEvent {
            id: download.id,
            file_id: download.book_file_id,
            file_name: file.map(|f| f.file_name),
            user_id: download.user_id,
            username: usernames.get(&download.user_id).cloned(),
            downloaded_at: download.downloaded_at,
            ip_address: download.ip_address,
        })
        .collect())
}

/// Library-wide figures for staff
pub async fn statistics(db: &DbConn) -> Result<StatisticsResponse> {
    let since = Utc::now() - Duration::days(DOWNLOAD_WINDOW_DAYS);

    let recent_borrows = BookBorrow::find()
        .order_by_desc(book_borrow::Column::BorrowedDate)
        .order_by_desc(book_borrow::Column::Id)
        .limit(RECENT_ACTIVITY)
        .all(db)
        .await?;

    Ok(StatisticsResponse {
        total_books: Book::find().count(db).await?,
        total_users: User::find().count(db).await?,
        total_downloads: BookDownload::find().count(db).await?,
        total_borrows: BookBorrow::find().count(db).await?,
        active_borrows: BookBorrow::find()
            .filter(book_borrow::Column::Status.eq(BorrowStatus::Approved.as_str()))
            .filter(book_borrow::Column::ReturnDate.is_null())
            .count(db)
            .await?,
        pending_borrows: BookBorrow::find()
            .filter(book_borrow::Column::Status.eq(BorrowStatus::Pending.as_str()))
            .count(db)
            .await?,
        users_by_role: UsersByRole {
            students: User::find()
                .filter(user::Column::Student.eq(true))
                .count(db)
                .await?,
            staff: User::find()
                .filter(user::Column::Staff.eq(true))
                .count(db)
                .await?,
            admins: User::find()
                .filter(user::Column::IsSuperuser.eq(true))
                .count(db)
                .await?,
        },
        top_categories: top_categories(db).await?,
        downloads_last_30_days: BookDownload::find()
            .filter(book_download::Column::DownloadedAt.gte(since))
            .count(db)
            .await?,
        top_downloaded_books: top_downloaded_books(db).await?,
        recent_downloads: recent_downloads(db).await?,
        recent_borrows: borrow::describe(db, recent_borrows).await?,
    })
}
