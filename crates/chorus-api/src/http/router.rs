//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/` except `/health`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Bots
        .route(
            "/bots",
            get(handlers::bot::list_bots)
                .post(handlers::bot::create_bot)
                .delete(handlers::bot::clear_bots),
        )
        .route("/bots/{id}", axum::routing::delete(handlers::bot::delete_bot))
        .route("/bots/{id}/prompt", put(handlers::bot::edit_prompt))
        .route("/models", get(handlers::bot::list_models))
        // Conversation
        .route(
            "/conversation",
            get(handlers::conversation::get_conversation)
                .delete(handlers::conversation::clear_conversation),
        )
        .route(
            "/conversation/initial-message",
            get(handlers::conversation::get_initial_message)
                .put(handlers::conversation::set_initial_message),
        )
        .route(
            "/conversation/generate",
            post(handlers::conversation::generate),
        )
        .route(
            "/conversation/generate/stream",
            post(handlers::conversation::generate_stream),
        )
        .route(
            "/conversation/continue",
            post(handlers::conversation::generate_more),
        )
        .route(
            "/conversation/save",
            post(handlers::conversation::save_conversation),
        )
        // History
        .route(
            "/history",
            get(handlers::history::list_history).delete(handlers::history::clear_history),
        )
        .route(
            "/history/{index}",
            axum::routing::delete(handlers::history::delete_history),
        )
        .route(
            "/history/{index}/load",
            post(handlers::history::load_history),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::test_state;

    #[tokio::test]
    async fn health_reports_version() {
        let axum::Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    async fn serve() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(test_state())).await.unwrap();
        });
        addr
    }

    async fn add_bot(client: &reqwest::Client, addr: std::net::SocketAddr, name: &str) {
        let resp = client
            .post(format!("http://{addr}/api/v1/bots"))
            .json(&serde_json::json!({
                "name": name,
                "model": "gpt-4o-mini",
                "prompt": format!("{name}'s role"),
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    /// `(event, data)` pairs from a complete SSE body.
    fn sse_events(body: &str) -> Vec<(String, serde_json::Value)> {
        body.split("\n\n")
            .filter_map(|block| {
                let mut event = None;
                let mut data = None;
                for line in block.lines() {
                    if let Some(name) = line.strip_prefix("event:") {
                        event = Some(name.trim().to_string());
                    } else if let Some(payload) = line.strip_prefix("data:") {
                        data = Some(serde_json::from_str(payload.trim()).unwrap());
                    }
                }
                Some((event?, data?))
            })
            .collect()
    }

    #[tokio::test]
    async fn router_serves_health_and_api_routes() {
        let addr = serve().await;

        let client = reqwest::Client::new();
        let health = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(health.status(), 200);

        let created: serde_json::Value = client
            .post(format!("http://{addr}/api/v1/bots"))
            .json(&serde_json::json!({
                "name": "Ada",
                "model": "gpt-4o-mini",
                "prompt": "An optimistic inventor",
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(created["data"]["name"], "Ada");

        let generate = client
            .post(format!("http://{addr}/api/v1/conversation/generate"))
            .json(&serde_json::json!({ "iterations": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(generate.status(), 400);
        let body: serde_json::Value = generate.json().await.unwrap();
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");

        let missing = client
            .post(format!("http://{addr}/api/v1/history/3/load"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
    }

    #[tokio::test]
    async fn generate_accepts_a_bodyless_post() {
        let addr = serve().await;
        let client = reqwest::Client::new();
        add_bot(&client, addr, "Ada").await;
        add_bot(&client, addr, "Bob").await;

        let resp = client
            .post(format!("http://{addr}/api/v1/conversation/generate"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        // Default config runs three rounds.
        assert_eq!(body["data"]["total_entries"], 6);
    }

    #[tokio::test]
    async fn generate_stream_emits_turn_events_then_done() {
        let addr = serve().await;
        let client = reqwest::Client::new();
        add_bot(&client, addr, "Ada").await;
        add_bot(&client, addr, "Bob").await;

        let resp = client
            .post(format!("http://{addr}/api/v1/conversation/generate/stream"))
            .json(&serde_json::json!({ "iterations": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let events = sse_events(&resp.text().await.unwrap());

        let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            [
                "turn_start",
                "text_delta",
                "turn_end",
                "turn_start",
                "text_delta",
                "turn_end",
                "done",
            ]
        );
        assert_eq!(events[0].1["speaker"], "Ada");
        assert_eq!(events[1].1["text"], "openai #1");
        assert_eq!(events[2].1["content"], "openai #1");
        assert_eq!(events[3].1["speaker"], "Bob");
        assert_eq!(events[6].1["provider_calls"], 2);

        let conversation: serde_json::Value = client
            .get(format!("http://{addr}/api/v1/conversation"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(conversation["data"]["entries"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn generate_stream_with_one_bot_sends_single_error() {
        let addr = serve().await;
        let client = reqwest::Client::new();
        add_bot(&client, addr, "Ada").await;

        let resp = client
            .post(format!("http://{addr}/api/v1/conversation/generate/stream"))
            .json(&serde_json::json!({ "iterations": 1 }))
            .send()
            .await
            .unwrap();
        let events = sse_events(&resp.text().await.unwrap());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "error");
        assert_eq!(events[0].1["code"], "VALIDATION_ERROR");
    }
}
