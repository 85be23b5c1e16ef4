use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyconnect_backend::{
    config::Config,
    db,
    middleware::rate_limit::{log_request, rate_limit_error_handler},
    repo::users,
    routes, AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyconnect_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    db::migrate(&db).await.expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    // Seed admin account if not exists
    users::seed_admin(&db, &config.admin_email, &config.admin_password)
        .await
        .expect("Failed to seed admin account");

    // Create app state
    let state = AppState {
        db,
        config: config.clone(),
    };

    // Create router with middleware
    let mut app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    if config.rate_limit_enabled {
        // Global ceiling: 100 requests per 60 seconds per IP
        let governor_config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(60)
                .burst_size(100)
                .finish()
                .expect("valid global governor config"),
        );
        app = app.layer(GovernorLayer::new(governor_config).error_handler(rate_limit_error_handler));
    }

    let app = app.layer(middleware::from_fn(log_request));

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
