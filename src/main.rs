//! Card Key Activation Service - Main Application Entry Point
//!
//! A REST API server that redeems card keys. The first accepted verify of a
//! code activates it and starts a fixed validity window; later verifies inside
//! that window renew the caller's session cookie without extending anything.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Admin Authentication**: API key with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{state::AppState, store::PgCardKeyStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!(
        activation_window_secs = config.activation_window_secs,
        "Configuration loaded"
    );

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let state = AppState::new(
        Arc::new(PgCardKeyStore::new(pool)),
        config.activation_window_secs,
    );
    let app = build_router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble the full router around `state`.
fn build_router(state: AppState) -> Router {
    // Admin routes, all behind the API key middleware
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/card-keys",
            post(handlers::admin::provision_card_keys),
        )
        .route(
            "/api/v1/admin/card-keys/{code}",
            get(handlers::admin::get_card_key),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        // Only POST is routed; anything else gets 405 from axum
        .route(
            "/api/v1/card-keys/verify",
            post(handlers::card_keys::verify_card_key),
        )
        .merge(admin_routes)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy derived from each request: the declared origin and requested
/// headers are reflected back, nothing is shared between requests.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_credentials(true)
}
