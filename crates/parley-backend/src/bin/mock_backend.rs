//! Stand-in inference backend for local development.
//!
//! Echoes every message back as `You said: <message>`.

use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use parley_backend::QueryRequest;

const DEFAULT_ADDR: &str = "0.0.0.0:5000";

async fn query(Json(req): Json<QueryRequest>) -> Json<Value> {
    tracing::info!(message = %req.message, "Responding to query");
    Json(json!({
        "response": format!("You said: {}", req.message),
        "status": "ok",
        "mock": true,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("MOCK_BACKEND_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let app = Router::new()
        .route("/query", post(query))
        .layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Mock backend listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
