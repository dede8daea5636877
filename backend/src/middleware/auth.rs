//! Authentication middleware
//!
//! Bearer-token session authentication and role-based access control.
//! Tokens are opaque; the SHA-256 hash of the presented token is matched
//! against the sessions table.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use shared::models::Role;

use crate::error::{AppError, AppResult, ErrorResponse};
use crate::services::auth::hash_token;
use crate::AppState;

/// Authenticated user information resolved from the session table
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub session_id: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    session_id: i64,
    expires_at: DateTime<Utc>,
    user_id: i64,
    username: String,
    role: String,
    user_status: String,
}

/// Authentication middleware validating `Authorization: Bearer <token>`
/// against an active, non-expired session joined to an active user.
/// Touches the session's `last_activity` on success.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    let row = match sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT s.id AS session_id, s.expires_at, u.id AS user_id, u.username,
               u.role, u.status AS user_status
        FROM user_sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = ? AND s.is_active = 1
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(&state.db)
    .await
    {
        Ok(Some(row)) => row,
        Ok(None) => {
            return AppError::Unauthorized("Invalid or revoked session".to_string())
                .into_response();
        }
        Err(e) => return AppError::Database(e).into_response(),
    };

    if row.expires_at <= Utc::now() {
        return AppError::Unauthorized("Session expired".to_string()).into_response();
    }
    if row.user_status != "active" {
        return AppError::Unauthorized("Account is disabled".to_string()).into_response();
    }

    let role = match Role::parse(&row.role) {
        Some(role) => role,
        None => {
            return AppError::Internal(format!("unknown role in users table: {}", row.role))
                .into_response();
        }
    };

    if let Err(e) = sqlx::query("UPDATE user_sessions SET last_activity = NOW() WHERE id = ?")
        .bind(row.session_id)
        .execute(&state.db)
        .await
    {
        return AppError::Database(e).into_response();
    }

    request.extensions_mut().insert(AuthUser {
        user_id: row.user_id,
        username: row.username,
        role,
        session_id: row.session_id,
    });

    next.run(request).await
}

/// Extractor for the authenticated user.
/// Use this in handlers behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (axum::http::StatusCode, axum::Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    axum::Json(ErrorResponse::new(
                        "AUTHENTICATION_ERROR",
                        "Authentication required",
                        None,
                    )),
                )
            })
    }
}

/// Role guard for handlers. Admin passes every check.
pub fn require_role(user: &AuthUser, allowed: &[Role]) -> AppResult<()> {
    if user.role.is_allowed(allowed) {
        Ok(())
    } else {
        let names: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
        Err(AppError::Forbidden(format!(
            "Requires one of roles: {}",
            names.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "test".to_string(),
            role,
            session_id: 1,
        }
    }

    #[test]
    fn admin_passes_any_guard() {
        assert!(require_role(&user(Role::Admin), &[Role::Manager]).is_ok());
        assert!(require_role(&user(Role::Admin), &[Role::Employee]).is_ok());
    }

    #[test]
    fn employee_blocked_from_manager_guard() {
        assert!(require_role(&user(Role::Employee), &[Role::Admin, Role::Manager]).is_err());
        assert!(require_role(&user(Role::Employee), &[Role::Employee]).is_ok());
    }
}
