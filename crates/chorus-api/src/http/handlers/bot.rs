//! Bot roster handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chorus_types::bot::{BotConfig, BotId, CreateBotRequest, ModelId};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// A bot as shown to API clients. The per-bot message history stays internal.
#[derive(Debug, Serialize)]
pub struct BotView {
    pub id: BotId,
    pub name: String,
    pub model: ModelId,
    pub prompt: String,
    pub color: String,
}

impl From<&BotConfig> for BotView {
    fn from(bot: &BotConfig) -> Self {
        Self {
            id: bot.id,
            name: bot.name.clone(),
            model: bot.model,
            prompt: bot.role_prompt.clone(),
            color: bot.color.hex().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditPromptRequest {
    pub prompt: String,
}

fn parse_bot_id(raw: &str) -> Result<BotId, AppError> {
    raw.parse::<BotId>()
        .map_err(|_| AppError::BadRequest(format!("'{raw}' is not a valid bot id")))
}

/// GET /api/v1/bots - List bots in speaking order.
pub async fn list_bots(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BotView>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state.session.lock().await;
    let bots: Vec<BotView> = session.bots().iter().map(BotView::from).collect();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(bots, request_id, elapsed)))
}

/// POST /api/v1/bots - Add a bot.
pub async fn create_bot(
    State(state): State<AppState>,
    Json(body): Json<CreateBotRequest>,
) -> Result<Json<ApiResponse<BotView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let bot = state.session.lock().await.add_bot(body)?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(BotView::from(&bot), request_id, elapsed)
        .with_link("prompt", &format!("/api/v1/bots/{}/prompt", bot.id));
    Ok(Json(resp))
}

/// PUT /api/v1/bots/{id}/prompt - Replace a bot's role prompt.
pub async fn edit_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EditPromptRequest>,
) -> Result<Json<ApiResponse<BotView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_bot_id(&id)?;
    let bot = state.session.lock().await.edit_bot_prompt(id, &body.prompt)?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(BotView::from(&bot), request_id, elapsed)))
}

/// DELETE /api/v1/bots/{id} - Remove one bot.
pub async fn delete_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BotView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_bot_id(&id)?;
    let bot = state.session.lock().await.delete_bot(id)?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(BotView::from(&bot), request_id, elapsed)))
}

/// DELETE /api/v1/bots - Remove every bot and the current conversation.
pub async fn clear_bots(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state.session.lock().await.clear_bots();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "cleared": true }),
        request_id,
        elapsed,
    )))
}

#[derive(Debug, Serialize)]
pub struct ModelView {
    pub id: ModelId,
    pub provider: String,
    pub available: bool,
}

/// GET /api/v1/models - Supported models and whether their provider is configured.
pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ModelView>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let available = state.engine.providers().available_models();
    let models = ModelId::ALL
        .iter()
        .map(|&id| ModelView {
            id,
            provider: id.provider_type().to_string(),
            available: available.contains(&id),
        })
        .collect();
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(models, request_id, elapsed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::test_state;
    use chorus_types::error::{SessionError, ValidationError};

    fn request(name: &str) -> CreateBotRequest {
        CreateBotRequest {
            name: name.to_string(),
            model: ModelId::Gpt4oMini,
            prompt: "A curious scientist".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_list_bots() {
        let state = test_state();
        let Json(created) = create_bot(State(state.clone()), Json(request("Ada")))
            .await
            .unwrap();
        let created = created.data.unwrap();
        assert_eq!(created.name, "Ada");
        assert_eq!(created.color, "#FF6B6B");

        let Json(listed) = list_bots(State(state)).await.unwrap();
        let listed = listed.data.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn sixth_bot_is_rejected() {
        let state = test_state();
        for name in ["A", "B", "C", "D", "E"] {
            create_bot(State(state.clone()), Json(request(name)))
                .await
                .unwrap();
        }
        let err = create_bot(State(state.clone()), Json(request("F")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::Validation(ValidationError::RegistryFull))
        ));
        assert_eq!(state.session.lock().await.bots().len(), 5);
    }

    #[tokio::test]
    async fn edit_prompt_of_unknown_bot_is_not_found() {
        let state = test_state();
        let err = edit_prompt(
            State(state),
            Path(Uuid::now_v7().to_string()),
            Json(EditPromptRequest {
                prompt: "new".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "BOT_NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_bot_id_is_bad_request() {
        let state = test_state();
        let err = delete_bot(State(state), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn delete_and_clear_bots() {
        let state = test_state();
        let Json(a) = create_bot(State(state.clone()), Json(request("A")))
            .await
            .unwrap();
        create_bot(State(state.clone()), Json(request("B")))
            .await
            .unwrap();

        let id = a.data.unwrap().id.to_string();
        let Json(deleted) = delete_bot(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(deleted.data.unwrap().name, "A");
        assert_eq!(state.session.lock().await.bots().len(), 1);

        clear_bots(State(state.clone())).await.unwrap();
        assert!(state.session.lock().await.bots().is_empty());
    }

    #[tokio::test]
    async fn models_report_configured_providers() {
        let Json(resp) = list_models(State(test_state())).await.unwrap();
        let models = resp.data.unwrap();
        assert_eq!(models.len(), ModelId::ALL.len());
        let claude = models
            .iter()
            .find(|m| m.id == ModelId::Claude35Sonnet)
            .unwrap();
        assert_eq!(claude.provider, "anthropic");
        assert!(claude.available);
    }
}
