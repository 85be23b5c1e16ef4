use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: UserRole) -> AppResult<()> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    if claims.role != role {
        tracing::warn!(user_id = %claims.sub, role = ?claims.role, required = ?role, "Role check failed");
        return Err(AppError::Forbidden(format!("{:?} access required", role)));
    }

    Ok(())
}

/// Require admin role
pub async fn require_admin(
    request: Request,
    next: Next,
) -> AppResult<Response> {
    require_role(&request, UserRole::Admin)?;
    Ok(next.run(request).await)
}

/// Require partner role
pub async fn require_partner(
    request: Request,
    next: Next,
) -> AppResult<Response> {
    require_role(&request, UserRole::Partner)?;
    Ok(next.run(request).await)
}

/// Require traveler role
pub async fn require_traveler(
    request: Request,
    next: Next,
) -> AppResult<Response> {
    require_role(&request, UserRole::Traveler)?;
    Ok(next.run(request).await)
}

/// Claims for routes that also serve anonymous callers. A missing header
/// yields `None`; a present but malformed header or invalid token is rejected.
pub struct MaybeClaims(pub Option<Claims>);

impl FromRequestParts<AppState> for MaybeClaims {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Unauthorized(format!("Malformed Authorization header: {}", e)))?;

        let Some(TypedHeader(auth)) = header else {
            return Ok(MaybeClaims(None));
        };

        verify_token(auth.token(), &state.config.jwt_secret).map(|claims| MaybeClaims(Some(claims)))
    }
}
