use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_session_cookie, create_session_cookie};
use crate::middleware::{Authenticated, ClientMeta, MaybeAuthenticated};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::prelude::*;
use crate::models::user;
use crate::schemas::user::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, UserResponse,
};
use crate::services::authentication::{authenticate, linked_institutional_id};
use crate::services::registration;
use crate::services::security::create_session_token;
use crate::state::AppState;

/// Registration and session routes (no session required)
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state)
}

/// Routes for the signed-in user's own account
pub fn profile_routes(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).post(update_profile))
        .with_state(state)
}

// ============================================================================
// Registration and Sessions
// ============================================================================

/// Register with a pre-approved institutional ID
async fn register(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let (created, record) = registration::register(&state.db, request).await?;

    state
        .audit
        .log_success(
            AuditAction::UserRegistered,
            ResourceType::User,
            Some(created.id.to_string()),
            Some(&created),
            Some(serde_json::json!({
                "institutional_id": record.institutional_id,
                "account_type": record.account_type,
            })),
            &client,
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_user(created, Some(record.institutional_id))),
    ))
}

/// Login with username or institutional ID
async fn login(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let Some(found_user) = authenticate(&state.db, &request.username, &request.password).await?
    else {
        state
            .audit
            .log_failure(
                AuditAction::LoginFailed,
                ResourceType::Session,
                None,
                None,
                Some(serde_json::json!({ "identifier": request.username })),
                &client,
                "Invalid credentials",
            )
            .await;
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let token = create_session_token(found_user.id, None)?;

    let mut active: user::ActiveModel = found_user.into();
    active.last_login = Set(Some(Utc::now()));
    let found_user = active.update(&state.db).await?;

    state
        .audit
        .log_success(
            AuditAction::Login,
            ResourceType::Session,
            None,
            Some(&found_user),
            None,
            &client,
        )
        .await;

    tracing::info!("User {} logged in", found_user.username);

    let institutional_id = linked_institutional_id(&state.db, &found_user).await?;
    let dashboard = found_user.landing_dashboard();
    let response = Json(LoginResponse {
        user: UserResponse::from_user(found_user, institutional_id),
        token: token.clone(),
        dashboard,
    });

    Ok((
        [(header::SET_COOKIE, create_session_cookie(&token))],
        response,
    )
        .into_response())
}

/// Logout - clears the session cookie
async fn logout(
    State(state): State<AppState>,
    MaybeAuthenticated(current): MaybeAuthenticated,
    client: ClientMeta,
) -> Response {
    if let Some(current) = &current {
        state
            .audit
            .log_success(
                AuditAction::Logout,
                ResourceType::Session,
                None,
                Some(current),
                None,
                &client,
            )
            .await;
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({"message": "You have been logged out successfully."})),
    )
        .into_response()
}

// ============================================================================
// Profile
// ============================================================================

async fn get_profile(
    State(state): State<AppState>,
    Authenticated(current): Authenticated,
) -> Result<Json<UserResponse>> {
    let institutional_id = linked_institutional_id(&state.db, &current).await?;
    Ok(Json(UserResponse::from_user(current, institutional_id)))
}

async fn update_profile(
    State(state): State<AppState>,
    Authenticated(current): Authenticated,
    client: ClientMeta,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    request.validate()?;

    let mut changed: Vec<&str> = Vec::new();
    let mut active: user::ActiveModel = current.clone().into();

    if let Some(first_name) = request.first_name {
        active.first_name = Set(first_name.trim().to_string());
        changed.push("first_name");
    }
    if let Some(last_name) = request.last_name {
        active.last_name = Set(last_name.trim().to_string());
        changed.push("last_name");
    }
    if let Some(email) = request.email {
        let email = email.trim().to_string();
        if email != current.email {
            let taken = User::find()
                .filter(user::Column::Email.eq(email.as_str()))
                .filter(user::Column::Id.ne(current.id))
                .one(&state.db)
                .await?
                .is_some();
            if taken {
                return Err(AppError::Conflict(
                    "A user with this email already exists.".to_string(),
                ));
            }
            active.email = Set(email);
            changed.push("email");
        }
    }
    if let Some(phone_number) = request.phone_number {
        active.phone_number = Set(Some(phone_number).filter(|p| !p.trim().is_empty()));
        changed.push("phone_number");
    }
    if let Some(address) = request.address {
        active.address = Set(Some(address).filter(|a| !a.trim().is_empty()));
        changed.push("address");
    }
    if let Some(date_of_birth) = request.date_of_birth {
        active.date_of_birth = Set(Some(date_of_birth));
        changed.push("date_of_birth");
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;

    state
        .audit
        .log_success(
            AuditAction::ProfileUpdated,
            ResourceType::User,
            Some(updated.id.to_string()),
            Some(&updated),
            Some(serde_json::json!({ "fields": changed })),
            &client,
        )
        .await;

    let institutional_id = linked_institutional_id(&state.db, &updated).await?;
    Ok(Json(UserResponse::from_user(updated, institutional_id)))
}
