use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::entities::listing;
use crate::error::AppResult;
use crate::middleware::auth::MaybeClaims;
use crate::repo::bookings::{self, Availability, AvailabilityQuery};
use crate::repo::{listings, users};
use crate::session::{resolve_view, View};
use crate::visibility::{Audience, ListingSearch};
use crate::AppState;

/// Search approved listings
pub async fn search_listings(
    State(state): State<AppState>,
    Query(search): Query<ListingSearch>,
) -> AppResult<Json<Vec<listing::Model>>> {
    Ok(Json(listings::search(&state.db, &search).await?))
}

/// Newest approved listings
pub async fn featured_listings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<listing::Model>>> {
    Ok(Json(listings::featured(&state.db).await?))
}

/// One listing. Partners and admins calling with a token see their wider scope.
pub async fn get_listing(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    Path(id): Path<Uuid>,
) -> AppResult<Json<listing::Model>> {
    let audience = Audience::from_claims(claims.as_ref());
    Ok(Json(listings::get_visible(&state.db, audience, id).await?))
}

/// Whether the listing is free for the requested stay
pub async fn listing_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    Ok(Json(bookings::check_availability(&state.db, id, query).await?))
}

/// A partner's storefront: their listings visible to travelers
pub async fn partner_listings(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<Vec<listing::Model>>> {
    Ok(Json(listings::public_for_partner(&state.db, partner_id).await?))
}

/// Liveness plus a round trip to the store
pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.db.ping().await?;
    Ok(Json(json!({
        "status": "online",
        "store": "reachable",
    })))
}

#[derive(Debug, Deserialize)]
pub struct SessionViewQuery {
    #[serde(default)]
    pub onboarding_complete: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionViewResponse {
    pub view: View,
}

/// Which top-level view the caller's client should show
pub async fn session_view(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    Query(query): Query<SessionViewQuery>,
) -> AppResult<Json<SessionViewResponse>> {
    let snapshot =
        users::session_snapshot(&state.db, claims.as_ref(), query.onboarding_complete).await?;
    Ok(Json(SessionViewResponse {
        view: resolve_view(&snapshot),
    }))
}
