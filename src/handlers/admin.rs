use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking;
use crate::entities::listing::{self, ListingStatus};
use crate::entities::partner_profile::{self, PartnerStatus};
use crate::error::{AppJson, AppResult};
use crate::handlers::auth::UserInfo;
use crate::repo::{bookings, listings, partners, users};
use crate::utils::jwt::Claims;
use crate::visibility::Audience;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

// ============ Partner moderation ============

pub async fn list_partners(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<partner_profile::Model>>> {
    Ok(Json(partners::list(&state.db, None).await?))
}

pub async fn pending_partners(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<partner_profile::Model>>> {
    Ok(Json(partners::list(&state.db, Some(PartnerStatus::Pending)).await?))
}

pub async fn approve_partner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<partner_profile::Model>> {
    Ok(Json(partners::approve(&state.db, id, claims.sub).await?))
}

pub async fn reject_partner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    payload: Option<AppJson<RejectRequest>>,
) -> AppResult<Json<partner_profile::Model>> {
    let reason = payload.and_then(|AppJson(body)| body.reason);
    Ok(Json(partners::reject(&state.db, id, claims.sub, reason).await?))
}

// ============ Listing moderation ============

pub async fn list_listings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<listing::Model>>> {
    Ok(Json(listings::list_for(&state.db, Audience::Admin, None).await?))
}

pub async fn pending_listings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<listing::Model>>> {
    Ok(Json(
        listings::list_for(&state.db, Audience::Admin, Some(ListingStatus::Pending)).await?,
    ))
}

pub async fn approve_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<listing::Model>> {
    Ok(Json(listings::approve(&state.db, id, claims.sub).await?))
}

pub async fn reject_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    payload: Option<AppJson<RejectRequest>>,
) -> AppResult<Json<listing::Model>> {
    let reason = payload.and_then(|AppJson(body)| body.reason);
    Ok(Json(listings::reject(&state.db, id, claims.sub, reason).await?))
}

// ============ Users and bookings ============

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserInfo>>> {
    let all = users::list_all(&state.db).await?;
    Ok(Json(all.into_iter().map(UserInfo::from).collect()))
}

pub async fn list_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<booking::Model>>> {
    Ok(Json(bookings::list_all(&state.db).await?))
}
