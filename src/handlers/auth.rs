use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppJson, AppResult};
use crate::repo::users::{self, Registration};
use crate::utils::jwt::{create_token, Claims};
use crate::utils::verification::send_verification_email;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        UserInfo {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            email_verified: u.email_verified,
            created_at: u.created_at.with_timezone(&Utc),
        }
    }
}

fn auth_response(state: &AppState, user: user::Model) -> AppResult<Json<AuthResponse>> {
    let token = create_token(
        user.id,
        &user.email,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Register a traveler or partner account and send the verification email.
///
/// The account stands even if the mail cannot be handed off; the client
/// re-sends through `/api/auth/verification`.
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Registration>,
) -> AppResult<Json<AuthResponse>> {
    let (user, verification_token) = users::register(&state.db, payload).await?;
    if let Err(e) = send_verification_email(&state.config, &user.email, &verification_token).await {
        tracing::warn!(user_id = %user.id, error = %e, "Verification email not sent at registration");
    }
    auth_response(&state, user)
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = users::authenticate(&state.db, &payload.email, &payload.password).await?;
    auth_response(&state, user)
}

/// Re-send the verification email for the calling account
pub async fn send_verification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<serde_json::Value>> {
    let (user, token) = users::issue_verification(&state.db, claims.sub).await?;
    send_verification_email(&state.config, &user.email, &token).await?;
    Ok(Json(serde_json::json!({ "message": "Verification email sent" })))
}

/// Consume a verification token
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = users::verify_email(&state.db, &payload.token).await?;
    Ok(Json(user.into()))
}

/// Current account, re-read from the store
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserInfo>> {
    let user = users::find(&state.db, claims.sub).await?;
    Ok(Json(user.into()))
}
