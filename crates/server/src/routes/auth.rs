//! Session login for the admin API.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::Json;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Log an admin in and start a session.
///
/// # Errors
///
/// 401 for bad credentials, 403 for a non-admin account.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginRequest>,
) -> Result<Json<CurrentUser>> {
    let user = AuthService::new(state.pool())
        .login_admin(&form.email, &form.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Admin login failed"))?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Admin logged in");

    Ok(Json(current))
}

/// End the current session.
///
/// # Errors
///
/// 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Who is logged in.
///
/// # Errors
///
/// 401 without a session.
pub async fn me(OptionalUser(user): OptionalUser) -> Result<Json<CurrentUser>> {
    user.map(Json)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))
}
