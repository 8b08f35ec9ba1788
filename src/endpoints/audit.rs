use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::{AdminOnly, Authorized};
use crate::services::audit::{get_audit_logs, AuditLogQuery, AuditLogResponse};
use crate::state::AppState;

/// Create audit routes
pub fn audit_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_audit_logs))
        .with_state(state)
}

/// List audit logs with filtering and pagination
async fn list_audit_logs(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<AuditLogResponse>> {
    let logs = get_audit_logs(&state.db, query).await?;
    Ok(Json(logs))
}
