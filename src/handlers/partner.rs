use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::approval::{ListingSubmission, ListingUpdate, PartnerSubmission, PartnerUpdate};
use crate::entities::{booking, listing, partner_profile};
use crate::error::{AppJson, AppResult};
use crate::repo::bookings::{self, BookingStatusUpdate, ListingStats};
use crate::repo::{listings, partners};
use crate::utils::jwt::Claims;
use crate::visibility::Audience;
use crate::AppState;

// ============ Profile ============

/// Submit the partner profile for admin review
pub async fn submit_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<PartnerSubmission>,
) -> AppResult<Json<partner_profile::Model>> {
    Ok(Json(partners::submit(&state.db, claims.sub, payload).await?))
}

/// Own profile, whatever its status
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<partner_profile::Model>> {
    Ok(Json(partners::find(&state.db, claims.sub).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<PartnerUpdate>,
) -> AppResult<Json<partner_profile::Model>> {
    Ok(Json(partners::update_business(&state.db, claims.sub, payload).await?))
}

// ============ Listings ============

pub async fn my_listings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<listing::Model>>> {
    Ok(Json(
        listings::list_for(&state.db, Audience::Partner(claims.sub), None).await?,
    ))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<ListingSubmission>,
) -> AppResult<Json<listing::Model>> {
    Ok(Json(listings::submit(&state.db, claims.sub, payload).await?))
}

pub async fn update_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ListingUpdate>,
) -> AppResult<Json<listing::Model>> {
    Ok(Json(listings::update_own(&state.db, claims.sub, id, payload).await?))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn set_listing_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SetActiveRequest>,
) -> AppResult<Json<listing::Model>> {
    Ok(Json(
        listings::set_active(&state.db, claims.sub, id, payload.is_active).await?,
    ))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    listings::delete_own(&state.db, claims.sub, id).await?;
    Ok(Json(serde_json::json!({ "message": "Listing deleted" })))
}

// ============ Bookings ============

pub async fn listing_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<booking::Model>>> {
    Ok(Json(bookings::list_for_partner(&state.db, claims.sub).await?))
}

/// Booking totals and revenue for one of the caller's listings
pub async fn listing_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ListingStats>> {
    Ok(Json(bookings::listing_stats(&state.db, claims.sub, id).await?))
}

pub async fn update_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<BookingStatusUpdate>,
) -> AppResult<Json<booking::Model>> {
    Ok(Json(
        bookings::update_for_partner(&state.db, claims.sub, id, payload).await?,
    ))
}
