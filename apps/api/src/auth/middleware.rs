use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::auth::{find_user, CurrentUser, SESSION_COOKIE};
use crate::errors::AppError;
use crate::state::AppState;

/// Resolves the session cookie to a user and stores it as a `CurrentUser` extension.
/// Requests without a live session stop here with 401.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let unauthorized = || AppError::Unauthorized("Authentication required".to_string());

    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(unauthorized)?;

    let Some(user_id) = state.sessions.resolve(&token).await? else {
        warn!("session token missing or expired, authentication denied");
        return Err(unauthorized());
    };

    let user = find_user(&state.db, user_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(unauthorized)?;

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
    });
    Ok(next.run(request).await)
}
