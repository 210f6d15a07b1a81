//! HTTP routes

pub mod health;
pub mod hosting;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::DirectoryMode,
    error::ApiError,
    routing::edge_routing_middleware,
    state::AppState,
};

/// Fallback for everything no route claims, including unknown tenants
async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Create the service's own routes (health + internal hosting endpoints)
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let mut router = Router::new().merge(health_routes);

    // Internal endpoints only make sense where the database is local, and are
    // never served without a shared secret.
    if state.config.directory_mode == DirectoryMode::Database {
        if state.config.internal_api_secret.is_some() {
            let internal_routes = Router::new()
                .route("/hosting/resolve", get(hosting::resolve))
                .route("/hosting/member", get(hosting::member))
                .route("/hosting/invalidate", post(hosting::invalidate))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    hosting::require_internal_secret,
                ));
            router = router.nest("/api/internal", internal_routes);
        } else {
            tracing::warn!("INTERNAL_API_SECRET not set, internal hosting endpoints disabled");
        }
    }

    router.fallback(not_found).with_state(state)
}

/// Full application: `pages` plus the service routes, behind the edge router.
///
/// The edge middleware wraps the inner router as a fallback service so that
/// rewritten URIs are routed against `pages`.
pub fn create_app(state: AppState, pages: Router) -> Router {
    let inner = pages.merge(create_router(state.clone()));

    Router::new()
        .fallback_service(inner)
        .layer(middleware::from_fn_with_state(state, edge_routing_middleware))
        .layer(TraceLayer::new_for_http())
}
