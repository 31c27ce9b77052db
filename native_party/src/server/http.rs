// HTTP handlers for the catalog and health endpoints.
//
// These are read-only views that never touch party state, so they can run
// outside the coordinator.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::server::AppState;

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn videos_handler(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog.clone();
    let listing = tokio::task::spawn_blocking(move || catalog.list_videos()).await;
    respond(listing, "videos")
}

pub async fn images_handler(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog.clone();
    let listing = tokio::task::spawn_blocking(move || catalog.list_images()).await;
    respond(listing, "images")
}

fn respond(
    listing: Result<anyhow::Result<Vec<party_shared::MediaEntry>>, tokio::task::JoinError>,
    what: &str,
) -> axum::response::Response {
    match listing {
        Ok(Ok(entries)) => (StatusCode::OK, Json(entries)).into_response(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, what, "catalog listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, what, "catalog task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
