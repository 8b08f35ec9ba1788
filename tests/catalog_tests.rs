//! Catalog integration tests
//!
//! Covers anonymous browsing, search, paging, book detail flags, staff
//! uploads, reviews, recommendations and categories under /library.

use axum::http::StatusCode;
use sea_orm::{EntityTrait, PaginatorTrait};

mod common;
use common::{get, post_json, post_multipart, seed_book, seed_category, seed_user, Kind, TestApp};

use academialink::models::prelude::*;

#[tokio::test]
async fn test_anonymous_visitors_can_browse() {
    let app = TestApp::new().await;
    seed_book(&app, "Pride and Prejudice", None, "pp.pdf", b"%PDF").await;

    let (status, body) = app.send(get("/library/books", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["books"][0]["title"], "Pride and Prejudice");
    assert_eq!(body["books"][0]["file_count"], 1);

    let (status, body) = app.send(get("/library/overview", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_books"], 1);
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_filters_category() {
    let app = TestApp::new().await;
    let science = seed_category(app.db(), "Science").await;
    seed_book(&app, "A Brief History of Time", Some(science.id), "t.pdf", b"%PDF").await;
    seed_book(&app, "Brief Lives", None, "l.pdf", b"%PDF").await;
    seed_book(&app, "Moby Dick", None, "m.pdf", b"%PDF").await;

    let (_, body) = app.send(get("/library/books?query=BRIEF", None)).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["query"], "brief");

    let (_, body) = app
        .send(get(
            &format!("/library/books?query=brief&category={}", science.id),
            None,
        ))
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["books"][0]["title"], "A Brief History of Time");
}

#[tokio::test]
async fn test_listing_pages_by_twelve() {
    let app = TestApp::new().await;
    for n in 0..13 {
        seed_book(&app, &format!("Volume {}", n), None, "v.txt", b"text").await;
    }

    let (_, first) = app.send(get("/library/books", None)).await;
    assert_eq!(first["books"].as_array().unwrap().len(), 12);
    assert_eq!(first["total_pages"], 2);

    let (_, second) = app.send(get("/library/books?page=2", None)).await;
    assert_eq!(second["books"].as_array().unwrap().len(), 1);
    assert_eq!(second["page"], 2);
}

#[tokio::test]
async fn test_detail_flags_follow_viewer() {
    let app = TestApp::new().await;
    let student = seed_user(app.db(), "looker", Kind::Student).await;
    let staff = seed_user(app.db(), "keeper", Kind::Staff).await;
    let (book, _) = seed_book(&app, "Walden", None, "walden.pdf", b"%PDF").await;
    let uri = format!("/library/books/{}", book.id);

    let (status, body) = app.send(get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["can_borrow"], false);
    assert_eq!(body["files"][0]["file_name"], "walden.pdf");
    assert!(body["files"][0].get("stored_path").is_none());

    let (_, body) = app.send(get(&uri, Some(&student))).await;
    assert_eq!(body["can_borrow"], true);
    assert_eq!(body["has_approved_access"], false);

    let (_, body) = app.send(get(&uri, Some(&staff))).await;
    assert_eq!(body["is_staff_access"], true);

    let (status, _) = app.send(get("/library/books/4242", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_staff_upload_stores_files() {
    let app = TestApp::new().await;
    let staff = seed_user(app.db(), "uploader", Kind::Staff).await;
    let category = seed_category(app.db(), "Poetry").await;
    let category_id = category.id.to_string();

    let (status, body) = app
        .send(post_multipart(
            "/library/books",
            &staff,
            &[
                ("title", None, "Leaves of Grass"),
                ("author", None, "Walt Whitman"),
                ("category_id", None, category_id.as_str()),
                ("files", Some("leaves.pdf"), "%PDF-leaves"),
                ("files", Some("cover.jpg"), "jpeg-bytes"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["book"]["title"], "Leaves of Grass");
    assert_eq!(body["book"]["uploaded_by"], staff.id);
    assert_eq!(body["files"].as_array().unwrap().len(), 2);

    let stored = BookFile::find().all(app.db()).await.unwrap();
    assert_eq!(stored.len(), 2);
    for file in stored {
        assert!(app.media.path().join(&file.stored_path).exists());
    }
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension_before_writing() {
    let app = TestApp::new().await;
    let staff = seed_user(app.db(), "careful", Kind::Staff).await;

    let (status, _) = app
        .send(post_multipart(
            "/library/books",
            &staff,
            &[
                ("title", None, "Payload"),
                ("author", None, "Nobody"),
                ("files", Some("notes.pdf"), "%PDF"),
                ("files", Some("run.exe"), "MZ"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(Book::find().count(app.db()).await.unwrap(), 0);
    assert!(!app.media.path().join("books").exists()
        || std::fs::read_dir(app.media.path().join("books")).unwrap().next().is_none());
}

#[tokio::test]
async fn test_students_cannot_upload() {
    let app = TestApp::new().await;
    let student = seed_user(app.db(), "sneaky", Kind::Student).await;

    let (status, _) = app
        .send(post_multipart(
            "/library/books",
            &student,
            &[("title", None, "Mine"), ("author", None, "Me")],
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_review_is_replaced_not_duplicated() {
    let app = TestApp::new().await;
    let reader = seed_user(app.db(), "critic", Kind::Student).await;
    let (book, _) = seed_book(&app, "Candide", None, "c.pdf", b"%PDF").await;
    let uri = format!("/library/books/{}/reviews", book.id);

    let (status, _) = app
        .send(post_json(&uri, Some(&reader), serde_json::json!({ "rating": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(post_json(
            &uri,
            Some(&reader),
            serde_json::json!({ "rating": 5, "comment": "Better on rereading" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 5);

    assert_eq!(BookReview::find().count(app.db()).await.unwrap(), 1);

    let (_, detail) = app.send(get(&format!("/library/books/{}", book.id), None)).await;
    assert_eq!(detail["avg_rating"], 5.0);
    assert_eq!(detail["reviews"][0]["reviewer"], "critic");

    let (status, _) = app
        .send(post_json(&uri, Some(&reader), serde_json::json!({ "rating": 6 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_staff_recommendation_reaches_student_dashboard() {
    let app = TestApp::new().await;
    let staff = seed_user(app.db(), "advisor", Kind::Staff).await;
    let student = seed_user(app.db(), "advisee", Kind::Student).await;
    let (book, _) = seed_book(&app, "Meditations", None, "med.pdf", b"%PDF").await;

    let (status, _) = app
        .send(post_json(
            &format!("/library/books/{}/recommend", book.id),
            Some(&student),
            serde_json::json!({ "message": "Read this" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(post_json(
            &format!("/library/books/{}/recommend", book.id),
            Some(&staff),
            serde_json::json!({ "message": "Read this" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send(get("/library/dashboard/student", Some(&student))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendations"][0]["book_title"], "Meditations");
    assert_eq!(body["recommendations"][0]["message"], "Read this");
}

#[tokio::test]
async fn test_categories_are_admin_managed() {
    let app = TestApp::new().await;
    let staff = seed_user(app.db(), "notadmin", Kind::Staff).await;
    let admin = seed_user(app.db(), "boss", Kind::Admin).await;

    let (status, _) = app
        .send(post_json(
            "/library/categories",
            Some(&staff),
            serde_json::json!({ "name": "History" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(post_json(
            "/library/categories",
            Some(&admin),
            serde_json::json!({ "name": "History" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "History");

    let (status, _) = app
        .send(post_json(
            "/library/categories",
            Some(&admin),
            serde_json::json!({ "name": "History" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.send(get("/library/categories", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}
