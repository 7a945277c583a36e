//! Conversation handlers: seed message, generation and the current transcript.
//!
//! Generation requests hold the session lock for the whole run; other
//! requests wait until it finishes.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use chorus_core::completion::CompletionUpdate;
use chorus_core::engine::{NoopObserver, RunOutcome, TurnObserver};
use chorus_types::bot::BotConfig;
use chorus_types::transcript::TranscriptEntry;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitialMessageRequest {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Rounds to run; the configured default when absent.
    #[serde(default)]
    pub iterations: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub initial_message: String,
    pub entries: Vec<TranscriptEntry>,
}

#[derive(Debug, Serialize)]
pub struct RunView {
    /// Entries added by this run.
    pub entries: Vec<TranscriptEntry>,
    pub provider_calls: usize,
    /// Length of the whole transcript after the run.
    pub total_entries: usize,
}

impl RunView {
    fn new(outcome: RunOutcome, total_entries: usize) -> Self {
        Self {
            entries: outcome.entries,
            provider_calls: outcome.provider_calls,
            total_entries,
        }
    }
}

/// Requested rounds; a missing body or `iterations` field means the
/// configured default.
fn rounds(state: &AppState, body: Option<Json<GenerateRequest>>) -> u32 {
    body.and_then(|Json(b)| b.iterations).unwrap_or(state.config.default_iterations)
}

/// GET /api/v1/conversation/initial-message
pub async fn get_initial_message(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InitialMessageView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let message = state.session.lock().await.initial_message().to_string();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        InitialMessageView { message },
        request_id,
        elapsed,
    )))
}

#[derive(Debug, Serialize)]
pub struct InitialMessageView {
    pub message: String,
}

/// PUT /api/v1/conversation/initial-message - Blank input restores the default.
pub async fn set_initial_message(
    State(state): State<AppState>,
    Json(body): Json<InitialMessageRequest>,
) -> Result<Json<ApiResponse<InitialMessageView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let mut session = state.session.lock().await;
    session.set_initial_message(&body.message);
    let message = session.initial_message().to_string();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        InitialMessageView { message },
        request_id,
        elapsed,
    )))
}

/// GET /api/v1/conversation - The current transcript.
pub async fn get_conversation(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ConversationView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state.session.lock().await;
    let view = ConversationView {
        initial_message: session.initial_message().to_string(),
        entries: session.transcript().entries().to_vec(),
    };
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(view, request_id, elapsed)))
}

/// POST /api/v1/conversation/generate - Start a fresh conversation and save it.
pub async fn generate(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<ApiResponse<RunView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    let iterations = rounds(&state, body);

    let mut session = state.session.lock().await;
    let outcome = session
        .generate(&state.engine, iterations, &mut NoopObserver)
        .await?;
    let view = RunView::new(outcome, session.transcript().len());
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(view, request_id, elapsed)
        .with_link("conversation", "/api/v1/conversation")
        .with_link("history", "/api/v1/history");
    Ok(Json(resp))
}

/// POST /api/v1/conversation/continue - Extend the current conversation.
pub async fn generate_more(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<ApiResponse<RunView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    let iterations = rounds(&state, body);

    let mut session = state.session.lock().await;
    let outcome = session
        .generate_more(&state.engine, iterations, &mut NoopObserver)
        .await?;
    let view = RunView::new(outcome, session.transcript().len());
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(view, request_id, elapsed)))
}

/// DELETE /api/v1/conversation - Drop the current transcript.
pub async fn clear_conversation(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state.session.lock().await.clear_conversation();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "cleared": true }),
        request_id,
        elapsed,
    )))
}

/// POST /api/v1/conversation/save - Append the current transcript to history.
pub async fn save_conversation(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let mut session = state.session.lock().await;
    session.save_conversation()?;
    let saved = session.history().len();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "history_entries": saved }),
        request_id,
        elapsed,
    )))
}

/// Forwards engine progress to an SSE response.
struct ChannelObserver {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelObserver {
    fn send(&self, name: &str, data: serde_json::Value) {
        // A closed channel means the client went away; the run still completes.
        let _ = self.tx.send(Event::default().event(name).data(data.to_string()));
    }
}

impl TurnObserver for ChannelObserver {
    fn on_turn_start(&mut self, bot: &BotConfig, round: u32) {
        self.send(
            "turn_start",
            serde_json::json!({ "speaker": bot.name, "round": round, "color": bot.color.hex() }),
        );
    }

    fn on_update(&mut self, bot: &BotConfig, update: &CompletionUpdate) {
        if update.delta.is_empty() {
            return;
        }
        self.send(
            "text_delta",
            serde_json::json!({ "speaker": bot.name, "text": update.delta, "is_error": update.is_error }),
        );
    }

    fn on_turn_end(&mut self, entry: &TranscriptEntry) {
        self.send(
            "turn_end",
            serde_json::to_value(entry).unwrap_or(serde_json::Value::Null),
        );
    }
}

/// POST /api/v1/conversation/generate/stream - Like `generate`, streaming
/// each turn as server-sent events.
///
/// Emits `turn_start`, `text_delta` and `turn_end` per turn, then `done`
/// (or a single `error` when the run could not start).
pub async fn generate_stream(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let iterations = rounds(&state, body);
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut observer = ChannelObserver { tx };
        let mut session = state.session.lock().await;
        let result = session
            .generate(&state.engine, iterations, &mut observer)
            .await;
        match result {
            Ok(outcome) => observer.send(
                "done",
                serde_json::json!({ "provider_calls": outcome.provider_calls }),
            ),
            Err(e) => {
                let err = AppError::from(e);
                observer.send(
                    "error",
                    serde_json::json!({ "code": err.code(), "message": err.message() }),
                );
            }
        }
    });

    let events = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
