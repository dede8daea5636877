//! HTTP handlers for authentication and session management

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use shared::models::Role;
use shared::types::ApiResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{
    AuthService, ChangePasswordInput, LoginInput, LoginResponse, SessionInfo,
};
use crate::AppState;

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let response = service.login(input).await?;
    Ok(Json(ApiResponse::new("Login successful", response)))
}

/// Revoke the current session
pub async fn logout(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    service.logout(current_user.0.session_id).await?;
    Ok(Json(ApiResponse::new("Session revoked", ())))
}

/// Echo of the authenticated user, as resolved by the middleware
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// Confirm the presented token is valid
pub async fn verify(current_user: CurrentUser) -> Json<ApiResponse<VerifyResponse>> {
    Json(ApiResponse::new(
        "Token is valid",
        VerifyResponse {
            user_id: current_user.0.user_id,
            username: current_user.0.username,
            role: current_user.0.role,
        },
    ))
}

/// Change the caller's password
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    service.change_password(&current_user.0, input).await?;
    Ok(Json(ApiResponse::new("Password changed", ())))
}

/// List the caller's sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<SessionInfo>>>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let sessions = service.list_sessions(current_user.0.user_id).await?;
    Ok(Json(ApiResponse::new("Sessions retrieved", sessions)))
}

/// Revoke a session by id
pub async fn revoke_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    service.revoke_session(&current_user.0, session_id).await?;
    Ok(Json(ApiResponse::new("Session revoked", ())))
}
