use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, partner, public, traveler};
use crate::middleware::auth::{auth_middleware, require_admin, require_partner, require_traveler};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let rate_limited = state.config.rate_limit_enabled;

    // Public auth routes
    let mut auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-email", post(auth::verify_email));

    // Authenticated account routes, any role
    let verification_routes = Router::new()
        .route("/verification", post(auth::send_verification))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
    let me_routes = Router::new()
        .route("/me", get(auth::me))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Browsing works without a token; a token widens the single-listing scope
    let mut public_routes = Router::new()
        .route("/listings", get(public::search_listings))
        .route("/listings/featured", get(public::featured_listings))
        .route("/listings/{id}", get(public::get_listing))
        .route("/listings/{id}/availability", get(public::listing_availability))
        .route("/partners/{id}/listings", get(public::partner_listings))
        .route("/session/view", get(public::session_view))
        .route("/health", get(public::health));

    if rate_limited {
        let public_governor = create_public_governor();
        auth_routes = auth_routes.layer(public_governor.clone());
        public_routes = public_routes.layer(public_governor);
    }

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        // Partner moderation
        .route("/partners", get(admin::list_partners))
        .route("/partners/pending", get(admin::pending_partners))
        .route("/partners/{id}/approve", post(admin::approve_partner))
        .route("/partners/{id}/reject", post(admin::reject_partner))
        // Listing moderation
        .route("/listings", get(admin::list_listings))
        .route("/listings/pending", get(admin::pending_listings))
        .route("/listings/{id}/approve", post(admin::approve_listing))
        .route("/listings/{id}/reject", post(admin::reject_listing))
        // Users and bookings
        .route("/users", get(admin::list_users))
        .route("/bookings", get(admin::list_bookings))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Partner routes (requires auth + partner role)
    let mut partner_routes = Router::new()
        .route("/profile", post(partner::submit_profile))
        .route("/profile", get(partner::get_profile))
        .route("/profile", put(partner::update_profile))
        .route("/listings", get(partner::my_listings))
        .route("/listings", post(partner::create_listing))
        .route("/listings/{id}", put(partner::update_listing))
        .route("/listings/{id}", delete(partner::delete_listing))
        .route("/listings/{id}/active", put(partner::set_listing_active))
        .route("/listings/{id}/stats", get(partner::listing_stats))
        .route("/bookings", get(partner::listing_bookings))
        .route("/bookings/{id}", put(partner::update_booking));
    if rate_limited {
        partner_routes = partner_routes.layer(create_role_governor(RateLimitedRole::Partner));
    }
    let partner_routes = partner_routes
        .layer(middleware::from_fn(require_partner))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Traveler routes (requires auth + traveler role)
    let mut traveler_routes = Router::new()
        .route("/profile", post(traveler::create_profile))
        .route("/profile", get(traveler::get_profile))
        .route("/profile", put(traveler::update_profile))
        .route("/favorites", get(traveler::list_favorites))
        .route("/favorites/{listing_id}", post(traveler::add_favorite))
        .route("/favorites/{listing_id}", delete(traveler::remove_favorite))
        .route("/bookings", post(traveler::create_booking))
        .route("/bookings", get(traveler::my_bookings))
        .route("/bookings/{id}", delete(traveler::cancel_booking));
    if rate_limited {
        traveler_routes = traveler_routes.layer(create_role_governor(RateLimitedRole::Traveler));
    }
    let traveler_routes = traveler_routes
        .layer(middleware::from_fn(require_traveler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes.merge(verification_routes))
        .nest("/api", public_routes.merge(me_routes))
        .nest("/api/admin", admin_routes)
        .nest("/api/partner", partner_routes)
        .nest("/api/traveler", traveler_routes)
        .with_state(state)
}
