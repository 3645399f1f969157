//! Content row handlers: dashboard feed listing and deletion

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::error;

use super::AppState;
use crate::server::types::*;

/// Default and maximum page sizes for the feed listing
const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ContentsQuery {
    #[serde(default)]
    limit: Option<usize>,
}

/// List the most recent content rows, newest first.
pub async fn list_contents(
    State(state): State<AppState>,
    Query(query): Query<ContentsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    match state.store.recent_contents(limit).await {
        Ok(data) => (
            StatusCode::OK,
            Json(ContentsResponse {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Contents listing failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Delete content rows by id.
pub async fn delete_contents(
    State(state): State<AppState>,
    Json(body): Json<DeleteBody>,
) -> impl IntoResponse {
    if body.ids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("at least one id is required")),
        )
            .into_response();
    }

    match state.store.delete_contents(&body.ids).await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(DeleteResponse {
                success: true,
                deleted,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Content deletion failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}
