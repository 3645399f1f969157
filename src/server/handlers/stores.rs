//! Store record handlers: the manual live-news edit path

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::error;

use super::AppState;
use crate::server::types::*;
use crate::types::StoreRecord;

/// Create or update a store record.
///
/// Manual edits always win: the store's write generation is bumped before
/// the write, so any crawl that started earlier can no longer synchronize
/// stale text over this one.
pub async fn upsert_store(
    State(state): State<AppState>,
    Json(body): Json<StoreUpsertBody>,
) -> impl IntoResponse {
    if body.store_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("storeId is required")),
        )
            .into_response();
    }

    state.pipeline.sync_gate().bump(&body.store_id);

    let record = StoreRecord {
        store_id: body.store_id.clone(),
        store_name: body.store_name,
        raw_info: body.raw_info,
        image_url: body.image_url,
        ai_structured_data: body.ai_structured_data,
        created_at: None,
    };

    match state.store.upsert_store(&record).await {
        Ok(()) => (StatusCode::OK, Json(OkResponse::new())).into_response(),
        Err(e) => {
            error!("Store upsert failed for {}: {}", body.store_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}
