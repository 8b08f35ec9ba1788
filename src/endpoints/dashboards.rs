use axum::{extract::State, routing::get, Json, Router};

use crate::error::Result;
use crate::middleware::{Authorized, StaffOnly, StudentOnly};
use crate::schemas::statistics::{StaffDashboard, StatisticsResponse, StudentDashboard};
use crate::services::statistics;
use crate::state::AppState;

pub fn dashboard_routes(state: AppState) -> Router {
    Router::new()
        .route("/dashboard/student", get(student_dashboard))
        .route("/dashboard/staff", get(staff_dashboard))
        .route("/statistics", get(library_statistics))
        .with_state(state)
}

async fn student_dashboard(
    State(state): State<AppState>,
    Authorized(current, _): Authorized<StudentOnly>,
) -> Result<Json<StudentDashboard>> {
    Ok(Json(statistics::student_dashboard(&state.db, &current).await?))
}

async fn staff_dashboard(
    State(state): State<AppState>,
    _auth: Authorized<StaffOnly>,
) -> Result<Json<StaffDashboard>> {
    Ok(Json(statistics::staff_dashboard(&state.db).await?))
}

async fn library_statistics(
    State(state): State<AppState>,
    _auth: Authorized<StaffOnly>,
) -> Result<Json<StatisticsResponse>> {
    Ok(Json(statistics::statistics(&state.db).await?))
}
