//! API key authentication middleware
//!
//! Keys come from `[http].api_keys`; an empty list disables auth entirely
//! (the single-operator deployment default). Keys are accepted either as a
//! bearer token or in an `x-api-key` header.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::types::ErrorResponse;

/// Shared authentication state
#[derive(Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
}

impl AuthState {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
        }
    }

    fn accepts(&self, request: &Request<Body>) -> bool {
        if self.api_keys.is_empty() {
            return true;
        }

        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .or_else(|| {
                request
                    .headers()
                    .get("x-api-key")
                    .and_then(|value| value.to_str().ok())
            });

        match presented {
            Some(key) => self.api_keys.iter().any(|known| known == key),
            None => false,
        }
    }
}

/// Reject requests without a valid API key.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if auth.accepts(&request) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("invalid or missing API key")),
        )
            .into_response()
    }
}
