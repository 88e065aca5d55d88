use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    config::Config,
    handlers::stream,
    middleware::logging,
    routes::{chat, health, history},
    state::AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        stream::post_chat,
        chat::delete_chat,
        chat::resume_stream,
        history::list_history,
        health::health_check,
    ),
    components(schemas(
        stream::PostChatRequest,
        stream::IncomingMessage,
        stream::ChatModel,
        health::HealthResponse,
    )),
    tags(
        (name = "chat", description = "Chat messaging and streams"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let max_duration = Duration::from_secs(state.config.server.max_duration_secs);

    Router::new()
        // Chat
        .route("/chat", post(stream::post_chat).delete(chat::delete_chat))
        .route("/chat/:id/stream", get(chat::resume_stream))
        .route("/history", get(history::list_history))
        // Ops
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(max_duration))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::permissive();
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
