//! Authentication service for login, session management and passwords
//!
//! Sessions are opaque bearer tokens: the client holds the token, the
//! database holds its SHA-256 hash with an expiry and activity timestamps.

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::models::Role;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Hash a session token for storage and lookup
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: MySqlPool,
    session_expiry_hours: i64,
    bcrypt_cost: u32,
}

/// Input for login
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Public view of an authenticated user
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// Response after successful login. The token is returned exactly once.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

/// Input for changing the caller's password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// A session row as listed back to its owner
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SessionInfo {
    pub id: i64,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    full_name: String,
    role: String,
    status: String,
}

impl AuthService {
    pub fn new(db: MySqlPool, config: &Config) -> Self {
        Self {
            db,
            session_expiry_hours: config.auth.session_expiry_hours,
            bcrypt_cost: config.auth.bcrypt_cost,
        }
    }

    /// Authenticate with username and password, creating a session
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, full_name, role, status
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(&input.username)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

        if user.status != "active" {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))?;
        if !valid {
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        let role = Role::parse(&user.role)
            .ok_or_else(|| AppError::Internal(format!("unknown role: {}", user.role)))?;

        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::hours(self.session_expiry_hours);

        sqlx::query(
            r#"
            INSERT INTO user_sessions (token_hash, user_id, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(hash_token(&token))
        .bind(user.id)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
            user: UserInfo {
                id: user.id,
                username: user.username,
                full_name: user.full_name,
                role,
            },
        })
    }

    /// Revoke the caller's current session
    pub async fn logout(&self, session_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE user_sessions SET is_active = 0 WHERE id = ?")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Change the caller's password, revoking every other session
    pub async fn change_password(
        &self,
        user: &AuthUser,
        input: ChangePasswordInput,
    ) -> AppResult<()> {
        if input.new_password.len() < 8 {
            return Err(AppError::validation(
                "new_password",
                "Password must be at least 8 characters",
            ));
        }

        let current_hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM users WHERE id = ?",
        )
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let valid = verify(&input.current_password, &current_hash)
            .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))?;
        if !valid {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = hash(&input.new_password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&new_hash)
            .bind(user.user_id)
            .execute(&mut *tx)
            .await?;
        // Other sessions die with the old password
        sqlx::query("UPDATE user_sessions SET is_active = 0 WHERE user_id = ? AND id <> ?")
            .bind(user.user_id)
            .bind(user.session_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// List the caller's sessions, newest first
    pub async fn list_sessions(&self, user_id: i64) -> AppResult<Vec<SessionInfo>> {
        let sessions = sqlx::query_as::<_, SessionInfo>(
            r#"
            SELECT id, user_id, expires_at, last_activity, is_active, created_at
            FROM user_sessions
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(sessions)
    }

    /// Revoke a session. Non-admins may only revoke their own sessions.
    pub async fn revoke_session(&self, caller: &AuthUser, session_id: i64) -> AppResult<()> {
        let owner_id = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM user_sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Session".to_string()))?;

        if owner_id != caller.user_id && caller.role != Role::Admin {
            return Err(AppError::Forbidden(
                "Cannot revoke another user's session".to_string(),
            ));
        }

        sqlx::query("UPDATE user_sessions SET is_active = 0 WHERE id = ?")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_hex() {
        let h1 = hash_token("abc");
        let h2 = hash_token("abc");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash_token("abd"), h1);
    }
}
