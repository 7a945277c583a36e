//! Saved-conversation handlers. Indices follow the newest-first listing.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use chorus_types::transcript::{HistoryEntry, TranscriptEntry};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub index: usize,
    pub label: String,
    pub initial_message: String,
    pub messages: usize,
}

impl HistoryItem {
    fn new(index: usize, entry: &HistoryEntry) -> Self {
        Self {
            index,
            label: entry.label(),
            initial_message: entry.initial_message.clone(),
            messages: entry.transcript.len(),
        }
    }
}

/// GET /api/v1/history - Saved conversations, newest first.
pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<HistoryItem>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state.session.lock().await;
    let items = session
        .history()
        .list()
        .enumerate()
        .map(|(index, entry)| HistoryItem::new(index, entry))
        .collect();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(items, request_id, elapsed)))
}

/// POST /api/v1/history/{index}/load - Make a saved conversation current.
pub async fn load_history(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse<Vec<TranscriptEntry>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let mut session = state.session.lock().await;
    let entries = session.load_history(index)?.entries().to_vec();
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(entries, request_id, elapsed)
        .with_link("conversation", "/api/v1/conversation");
    Ok(Json(resp))
}

/// DELETE /api/v1/history/{index}
pub async fn delete_history(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse<HistoryItem>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let removed = state.session.lock().await.delete_history(index)?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        HistoryItem::new(index, &removed),
        request_id,
        elapsed,
    )))
}

/// DELETE /api/v1/history
pub async fn clear_history(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state.session.lock().await.clear_history();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "cleared": true }),
        request_id,
        elapsed,
    )))
}
