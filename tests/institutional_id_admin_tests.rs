//! Institutional ID administration integration tests
//!
//! Covers /admin/institutional-ids:
//! - CRUD and search (administrators only)
//! - bulk status changes and generation
//! - CSV import via multipart upload and CSV export

use axum::http::StatusCode;
use http_body_util::BodyExt;
use sea_orm::{EntityTrait, PaginatorTrait};

mod common;
use common::{
    get, json_request, post_json, post_multipart, seed_institutional_id, seed_user, Kind, TestApp,
};

use academialink::models::institutional_id::IdStatus;
use academialink::models::prelude::*;

const IMPORT_HEADER: &str =
    "institutional_id,account_type,first_name,last_name,email,academic_level,department\n";

#[tokio::test]
async fn test_admin_only() {
    let app = TestApp::new().await;
    let staff = seed_user(app.db(), "staffonly", Kind::Staff).await;

    let (status, _) = app.send(get("/admin/institutional-ids", Some(&staff))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(get("/admin/institutional-ids", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_generates_value_when_blank() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "registrar", Kind::Admin).await;

    let (status, body) = app
        .send(post_json(
            "/admin/institutional-ids",
            Some(&admin),
            serde_json::json!({ "account_type": "staff", "first_name": "Alan" }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    let value = body["institutional_id"].as_str().unwrap();
    assert_eq!(value.len(), 8);
    assert!(value.starts_with('3'));
    assert_eq!(body["status"], "active");
    assert_eq!(body["is_available"], true);
    assert_eq!(body["added_by"], admin.id);

    let (status, _) = app
        .send(post_json(
            "/admin/institutional-ids",
            Some(&admin),
            serde_json::json!({ "institutional_id": value }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_get_and_delete() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "editor", Kind::Admin).await;
    let record = seed_institutional_id(app.db(), "20000500", IdStatus::Active, None).await;
    let uri = format!("/admin/institutional-ids/{}", record.id);

    let (status, body) = app
        .send(json_request(
            "PATCH",
            &uri,
            Some(&admin),
            serde_json::json!({ "department": "Physics", "status": "revoked" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["department"], "Physics");
    assert_eq!(body["status"], "revoked");
    assert_eq!(body["is_available"], false);

    let (status, body) = app.send(get(&uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["institutional_id"], "20000500");

    let (status, _) = app
        .send(json_request("DELETE", &uri, Some(&admin), serde_json::json!({})))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(get(&uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters_by_status_and_search() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "lister", Kind::Admin).await;
    seed_institutional_id(app.db(), "20000601", IdStatus::Active, None).await;
    seed_institutional_id(app.db(), "20000602", IdStatus::Revoked, None).await;
    seed_institutional_id(app.db(), "30000603", IdStatus::Active, None).await;

    let (_, body) = app
        .send(get("/admin/institutional-ids?status=active", Some(&admin)))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app
        .send(get(
            "/admin/institutional-ids?account_type=staff",
            Some(&admin),
        ))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app
        .send(get("/admin/institutional-ids?search=0602", Some(&admin)))
        .await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["institutional_id"], "20000602");
}

#[tokio::test]
async fn test_bulk_status_change() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "bulk", Kind::Admin).await;
    let a = seed_institutional_id(app.db(), "20000701", IdStatus::Active, None).await;
    let b = seed_institutional_id(app.db(), "20000702", IdStatus::Active, None).await;

    let (status, body) = app
        .send(post_json(
            "/admin/institutional-ids/status",
            Some(&admin),
            serde_json::json!({ "ids": [a.id, b.id], "status": "revoked" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let stored = InstitutionalId::find_by_id(a.id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "revoked");

    let (status, _) = app
        .send(post_json(
            "/admin/institutional-ids/status",
            Some(&admin),
            serde_json::json!({ "ids": [a.id], "status": "used" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_ids() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "generator", Kind::Admin).await;

    let (status, body) = app
        .send(post_json(
            "/admin/institutional-ids/generate",
            Some(&admin),
            serde_json::json!({ "count": 5, "account_type": "student", "department": "Law" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 5);

    let values: Vec<&str> = body["institutional_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    let mut unique = values.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
    assert!(values.iter().all(|v| v.len() == 8 && v.starts_with('2')));

    let (status, _) = app
        .send(post_json(
            "/admin/institutional-ids/generate",
            Some(&admin),
            serde_json::json!({ "count": 101 }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(InstitutionalId::find().count(app.db()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_csv_import_reports_bad_rows() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "importer", Kind::Admin).await;
    seed_institutional_id(app.db(), "20000099", IdStatus::Active, None).await;

    let csv = format!(
        "{IMPORT_HEADER}\
         20000801,student,Ada,Lovelace,ada@uni.edu,freshman,Maths\n\
         30000802,staff,Alan,Turing,,faculty,CS\n\
         20000099,student,,,,,\n\
         20000803,,Grace,Hopper,,,\n"
    );

    let (status, body) = app
        .send(post_multipart(
            "/admin/institutional-ids/import",
            &admin,
            &[("csv_file", Some("ids.csv"), csv.as_str())],
        ))
        .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["created_count"], 3);
    assert_eq!(body["error_count"], 1);
    assert_eq!(body["errors"][0], "Row 4: ID '20000099' already exists");
}

#[tokio::test]
async fn test_csv_import_requires_csv_file() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "picky", Kind::Admin).await;

    let (status, body) = app
        .send(post_multipart(
            "/admin/institutional-ids/import",
            &admin,
            &[("csv_file", Some("ids.xlsx"), "not,really\n")],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Please upload a CSV file.");
}

#[tokio::test]
async fn test_csv_export() {
    let app = TestApp::new().await;
    let admin = seed_user(app.db(), "exporter", Kind::Admin).await;
    let first = seed_institutional_id(app.db(), "20000901", IdStatus::Active, None).await;
    seed_institutional_id(app.db(), "20000902", IdStatus::Revoked, None).await;

    let response = app
        .send_raw(get("/admin/institutional-ids/export", Some(&admin)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"institutional_ids.csv\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Institutional ID,Account Type,Status,"));
    assert_eq!(text.lines().count(), 3);

    let response = app
        .send_raw(get(
            &format!("/admin/institutional-ids/export?ids={}", first.id),
            Some(&admin),
        ))
        .await;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("20000901,student,active"));
}
