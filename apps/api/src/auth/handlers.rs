use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::current_user::bearer_token;
use crate::auth::identity::IdentityError;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn auth_error(e: IdentityError) -> AppError {
    match e {
        IdentityError::Rejected { message, .. } => AppError::Auth(message),
        IdentityError::Http(e) => AppError::Internal(anyhow::Error::new(e)),
    }
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Json<SignupResponse>, AppError> {
    let receipt = state
        .identity
        .sign_up(&payload.email, &payload.password)
        .await
        .map_err(auth_error)?;

    // Providers with email confirmation return a pending user; autoconfirm
    // deployments hand back a ready session instead.
    let message = if receipt.confirmation_sent_at.is_some() {
        "Signup successful. Check your email for verification."
    } else {
        "Signup successful."
    };
    Ok(Json(SignupResponse {
        message: message.to_string(),
        user_id: receipt.id,
    }))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = state
        .identity
        .sign_in(&payload.email, &payload.password)
        .await
        .map_err(auth_error)?;

    info!("User {} logged in", session.user.id);
    Ok(Json(LoginResponse {
        access_token: session.access_token,
        token_type: session.token_type,
        expires_in: session.expires_in,
        user_id: session.user.id,
        email: session.user.email,
    }))
}

/// POST /api/v1/auth/logout
///
/// Revokes the session at the identity provider; the client drops its
/// token. No server-side session state exists to clear.
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers)?;
    state.identity.sign_out(token).await.map_err(auth_error)?;
    Ok(StatusCode::NO_CONTENT)
}
