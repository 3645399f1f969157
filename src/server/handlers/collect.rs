//! Collection handlers: single URL, keyword batch, keyword search

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, error};

use super::AppState;
use crate::pipeline::{CollectOutcome, CollectRequest};
use crate::server::types::*;
use crate::types::CollectionMode;

/// Run one URL through the collection pipeline.
pub async fn collect(
    State(state): State<AppState>,
    Json(body): Json<CollectBody>,
) -> impl IntoResponse {
    if body.url.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("url is required")),
        )
            .into_response();
    }

    debug!("HTTP collect request: {}", body.url);

    let request = CollectRequest {
        url: body.url.clone(),
        keyword: body.keyword,
        group_name: body.group_name,
        collection_mode: body.collection_mode,
        store_id: body.store_id,
    };

    match state.pipeline.collect(&request).await {
        Ok(CollectOutcome::Inserted { count, items }) => {
            (StatusCode::OK, Json(CollectResponse::inserted(count, items))).into_response()
        }
        Ok(CollectOutcome::Duplicate) => {
            (StatusCode::OK, Json(CollectResponse::duplicate())).into_response()
        }
        Ok(CollectOutcome::NoContent) => {
            (StatusCode::OK, Json(CollectResponse::empty())).into_response()
        }
        Err(e) => {
            error!("Collect failed for {}: {}", body.url, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Resolve the effective collection mode for keyword operations: an
/// explicit mode wins; otherwise a store target implies store mode.
fn effective_mode(mode: Option<CollectionMode>, store_id: Option<&str>) -> CollectionMode {
    mode.unwrap_or(if store_id.is_some() {
        CollectionMode::Store
    } else {
        CollectionMode::Net
    })
}

/// Search a keyword and collect every resulting URL sequentially.
pub async fn collect_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchBody>,
) -> impl IntoResponse {
    if body.keyword.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("keyword is required")),
        )
            .into_response();
    }

    let mode = effective_mode(body.collection_mode, body.store_id.as_deref());
    debug!("HTTP batch request: {} ({})", body.keyword, mode);

    match state
        .batch
        .run(&body.keyword, mode, body.group_name, body.store_id)
        .await
    {
        Ok(report) => (
            StatusCode::OK,
            Json(BatchResponse {
                success: true,
                attempted: report.attempted,
                inserted: report.inserted,
                duplicates: report.duplicates,
                empty: report.empty,
                failures: report.failures,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Batch search failed for {}: {}", body.keyword, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Search a keyword and return the candidate URLs without collecting them.
pub async fn search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> impl IntoResponse {
    if body.keyword.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("keyword is required")),
        )
            .into_response();
    }

    let mode = effective_mode(body.collection_mode, None);

    match state.batch.search_urls(&body.keyword, mode).await {
        Ok(urls) => (
            StatusCode::OK,
            Json(SearchResponse {
                success: true,
                urls,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Search failed for {}: {}", body.keyword, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_mode() {
        assert_eq!(effective_mode(None, None), CollectionMode::Net);
        assert_eq!(effective_mode(None, Some("s")), CollectionMode::Store);
        assert_eq!(
            effective_mode(Some(CollectionMode::Sniper), Some("s")),
            CollectionMode::Sniper
        );
    }
}
