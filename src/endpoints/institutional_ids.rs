use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{AdminOnly, Authorized, ClientMeta};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::schemas::institutional_id::{
    BulkStatusRequest, BulkStatusResponse, CreateInstitutionalIdRequest, ExportQuery,
    GenerateIdsRequest, GenerateIdsResponse, ImportReport, InstitutionalIdResponse, ListIdsQuery,
    UpdateInstitutionalIdRequest,
};
use crate::services::institutional_ids::{self, csv};
use crate::state::AppState;

const EXPORT_FILE_NAME: &str = "institutional_ids.csv";

pub fn institutional_id_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_ids).post(create_id))
        .route("/status", post(bulk_status))
        .route("/generate", post(generate_ids))
        .route("/import", post(import_ids))
        .route("/export", get(export_ids))
        .route("/{id}", get(get_id).patch(update_id).delete(delete_id))
        .with_state(state)
}

// ============================================================================
// Single Records
// ============================================================================

async fn list_ids(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    Query(query): Query<ListIdsQuery>,
) -> Result<Json<Vec<InstitutionalIdResponse>>> {
    let records = institutional_ids::list(&state.db, &query).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

async fn create_id(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    Json(request): Json<CreateInstitutionalIdRequest>,
) -> Result<(StatusCode, Json<InstitutionalIdResponse>)> {
    request.validate()?;
    let created = institutional_ids::create(&state.db, request, admin.id).await?;

    state
        .audit
        .log_success(
            AuditAction::IdCreated,
            ResourceType::InstitutionalId,
            Some(created.institutional_id.clone()),
            Some(&admin),
            Some(serde_json::json!({ "account_type": created.account_type })),
            &client,
        )
        .await;

    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn get_id(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    Path(id): Path<i64>,
) -> Result<Json<InstitutionalIdResponse>> {
    Ok(Json(institutional_ids::get(&state.db, id).await?.into()))
}

async fn update_id(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    Path(id): Path<i64>,
    Json(request): Json<UpdateInstitutionalIdRequest>,
) -> Result<Json<InstitutionalIdResponse>> {
    request.validate()?;
    let updated = institutional_ids::update(&state.db, id, request).await?;

    state
        .audit
        .log_success(
            AuditAction::IdUpdated,
            ResourceType::InstitutionalId,
            Some(updated.institutional_id.clone()),
            Some(&admin),
            Some(serde_json::json!({ "status": updated.status })),
            &client,
        )
        .await;

    Ok(Json(updated.into()))
}

async fn delete_id(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let deleted = institutional_ids::delete(&state.db, id).await?;

    state
        .audit
        .log_success(
            AuditAction::IdDeleted,
            ResourceType::InstitutionalId,
            Some(deleted.institutional_id),
            Some(&admin),
            None,
            &client,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Bulk Operations
// ============================================================================

async fn bulk_status(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    Json(request): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>> {
    let updated = institutional_ids::set_status_bulk(&state.db, &request.ids, request.status).await?;

    state
        .audit
        .log_success(
            AuditAction::IdStatusChanged,
            ResourceType::InstitutionalId,
            None,
            Some(&admin),
            Some(serde_json::json!({
                "ids": request.ids,
                "status": request.status,
                "updated": updated,
            })),
            &client,
        )
        .await;

    Ok(Json(BulkStatusResponse {
        updated,
        status: request.status,
    }))
}

async fn generate_ids(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    Json(request): Json<GenerateIdsRequest>,
) -> Result<(StatusCode, Json<GenerateIdsResponse>)> {
    let created = institutional_ids::generate_bulk(&state.db, &request, Some(admin.id)).await?;

    state
        .audit
        .log_success(
            AuditAction::IdsGenerated,
            ResourceType::InstitutionalId,
            None,
            Some(&admin),
            Some(serde_json::json!({ "count": created.len() })),
            &client,
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(GenerateIdsResponse {
            count: created.len(),
            institutional_ids: created.into_iter().map(|r| r.institutional_id).collect(),
        }),
    ))
}

/// Multipart upload with a single `csv_file` field
async fn import_ids(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("csv_file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_lowercase();
        if !file_name.ends_with(".csv") {
            return Err(AppError::BadRequest("Please upload a CSV file.".to_string()));
        }
        upload = Some(field.bytes().await?);
    }

    let data = upload.ok_or_else(|| AppError::BadRequest("Please upload a CSV file.".to_string()))?;

    let report = match csv::import_csv(&state.db, &data, admin.id).await {
        Ok(report) => report,
        Err(e) => {
            state
                .audit
                .log_failure(
                    AuditAction::IdsImported,
                    ResourceType::InstitutionalId,
                    None,
                    Some(&admin),
                    None,
                    &client,
                    &e.to_string(),
                )
                .await;
            return Err(e);
        }
    };

    state
        .audit
        .log_success(
            AuditAction::IdsImported,
            ResourceType::InstitutionalId,
            None,
            Some(&admin),
            Some(serde_json::json!({
                "created": report.created_count,
                "errors": report.error_count,
            })),
            &client,
        )
        .await;

    Ok(Json(report))
}

async fn export_ids(
    State(state): State<AppState>,
    Authorized(admin, _): Authorized<AdminOnly>,
    client: ClientMeta,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let (count, data) = csv::export_csv(&state.db, &query.selected_ids()).await?;

    state
        .audit
        .log_success(
            AuditAction::IdsExported,
            ResourceType::InstitutionalId,
            None,
            Some(&admin),
            Some(serde_json::json!({ "count": count })),
            &client,
        )
        .await;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        data,
    ))
}
