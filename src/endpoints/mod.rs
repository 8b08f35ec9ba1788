pub mod accounts;
pub mod audit;
pub mod books;
pub mod borrows;
pub mod dashboards;
pub mod files;
pub mod institutional_ids;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, routing::get, Json, Router};

use crate::config::CONFIG;
use crate::middleware::{attach_user, require_auth, security_headers};
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(CONFIG.storage.max_upload_bytes);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .nest("/accounts", accounts::auth_routes(state.clone()));

    // Catalog browsing is open to anonymous visitors; writes check roles per handler
    let catalog_routes = books::book_routes(state.clone())
        .layer(upload_limit)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            attach_user,
        ));

    // Protected routes (auth required)
    let protected_library = Router::new()
        .nest("/borrows", borrows::borrow_routes(state.clone()))
        .merge(files::file_routes(state.clone()))
        .merge(dashboards::dashboard_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let protected_routes = Router::new()
        .nest("/accounts", accounts::profile_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes
        .merge(protected_routes)
        .nest("/library", catalog_routes.merge(protected_library))
        .layer(axum_middleware::from_fn(security_headers))
}

/// Administrator routes under /admin/* (protected by auth middleware)
fn admin_routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/institutional-ids",
            institutional_ids::institutional_id_routes(state.clone())
                .layer(DefaultBodyLimit::max(CONFIG.storage.max_upload_bytes)),
        )
        .nest("/audit-logs", audit::audit_routes(state))
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": CONFIG.version,
    }))
}
