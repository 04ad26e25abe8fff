//! Axum route handlers for the Auth API.

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{
    create_user, find_user_by_username, hash_password, verify_login, CurrentUser,
    SESSION_COOKIE,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    /// Both fields present and non-blank; the username is trimmed.
    fn require(self) -> Result<(String, String), AppError> {
        let username = self.username.map(|u| u.trim().to_string()).unwrap_or_default();
        let password = self.password.unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        Ok((username, password))
    }
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (username, password) = credentials.require()?;

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(AppError::Internal)?;

    create_user(&state.db, &username, &password_hash)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::Validation("User already exists".to_string()))?;

    info!("Registered user {username}");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let (username, password) = credentials.require()?;
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = find_user_by_username(&state.db, &username)
        .await
        .map_err(AppError::Internal)?;

    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let valid =
        tokio::task::spawn_blocking(move || verify_login(&password, stored_hash.as_deref()))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
    let user = match user {
        Some(user) if valid => user,
        _ => return Err(invalid()),
    };

    let token = state.sessions.create(user.id).await?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure);

    info!("User {} logged in", user.username);
    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "user": { "id": user.id, "username": user.username }
        })),
    ))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let not_logged_in = || AppError::Unauthorized("User not logged in".to_string());

    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(not_logged_in)?;

    if !state.sessions.destroy(&token).await? {
        return Err(not_logged_in());
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/");
    Ok((
        jar.remove(removal),
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

/// GET /api/v1/auth/me
pub async fn handle_me(Extension(user): Extension<CurrentUser>) -> Json<CurrentUser> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: Option<&str>, password: Option<&str>) -> Credentials {
        Credentials {
            username: username.map(String::from),
            password: password.map(String::from),
        }
    }

    #[test]
    fn test_require_trims_username() {
        let (u, p) = creds(Some("  ayan "), Some("123456")).require().unwrap();
        assert_eq!(u, "ayan");
        assert_eq!(p, "123456");
    }

    #[test]
    fn test_require_rejects_missing_fields() {
        for c in [
            creds(None, Some("pw")),
            creds(Some("ayan"), None),
            creds(Some("   "), Some("pw")),
            creds(Some("ayan"), Some("")),
        ] {
            assert!(matches!(c.require(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn test_credentials_deserialize_with_missing_keys() {
        let c: Credentials = serde_json::from_str(r#"{"username": "ayan"}"#).unwrap();
        assert_eq!(c.username.as_deref(), Some("ayan"));
        assert!(c.password.is_none());
    }
}
