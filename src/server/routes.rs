//! HTTP API route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::auth::{auth_middleware, AuthState};
use super::handlers::{self, AppState};

/// Create the API router with all routes mounted under /api/v1.
pub fn create_router(app_state: AppState, auth_state: AuthState) -> Router {
    let api_v1 = Router::new()
        .route("/health", get(handlers::health))
        .route("/collect", post(handlers::collect))
        .route("/collect/batch", post(handlers::collect_batch))
        .route("/search", post(handlers::search))
        .route(
            "/contents",
            get(handlers::list_contents).delete(handlers::delete_contents),
        )
        .route("/stores", post(handlers::upsert_store))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(app_state);

    Router::new().nest("/api/v1", api_v1)
}
