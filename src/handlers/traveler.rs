use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::entities::{booking, listing, traveler_profile};
use crate::error::{AppJson, AppResult};
use crate::repo::bookings::{self, BookingRequest};
use crate::repo::favorites;
use crate::repo::travelers::{self, TravelerProfileInput, TravelerProfileUpdate};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Profile ============

pub async fn create_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<TravelerProfileInput>,
) -> AppResult<Json<traveler_profile::Model>> {
    Ok(Json(travelers::create(&state.db, claims.sub, payload).await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<traveler_profile::Model>> {
    Ok(Json(travelers::get(&state.db, claims.sub).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<TravelerProfileUpdate>,
) -> AppResult<Json<traveler_profile::Model>> {
    Ok(Json(travelers::update(&state.db, claims.sub, payload).await?))
}

// ============ Favorites ============

pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<listing::Model>>> {
    Ok(Json(favorites::list(&state.db, claims.sub).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    favorites::add(&state.db, claims.sub, listing_id).await?;
    Ok(Json(serde_json::json!({ "message": "Listing saved" })))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    favorites::remove(&state.db, claims.sub, listing_id).await?;
    Ok(Json(serde_json::json!({ "message": "Listing removed from favorites" })))
}

// ============ Bookings ============

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<BookingRequest>,
) -> AppResult<Json<booking::Model>> {
    Ok(Json(bookings::create(&state.db, claims.sub, payload).await?))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<booking::Model>>> {
    Ok(Json(bookings::list_for_traveler(&state.db, claims.sub).await?))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    Ok(Json(bookings::cancel(&state.db, claims.sub, booking_id).await?))
}
