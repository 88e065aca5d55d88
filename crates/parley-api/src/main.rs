use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::{
    config::{Config, StorageBackend},
    router::build_router,
    session::{HeaderSessionResolver, SessionResolver},
    state::AppState,
    streaming::{InMemoryStreamContext, ResumableStreamContext},
};
use parley_backend::{BackendClient, HttpBackendClient};
use parley_persist::{InMemoryPersistence, MongoPersistenceClient, PersistenceClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let persist: Arc<dyn PersistenceClient> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; chats are lost on restart");
            Arc::new(InMemoryPersistence::new())
        }
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let client =
                MongoPersistenceClient::connect(&config.mongodb_uri, &config.storage.database).await?;
            tracing::info!("MongoDB connected");
            Arc::new(client)
        }
    };

    tracing::info!(base_url = %config.backend.base_url, "Initializing backend client");
    let backend: Arc<dyn BackendClient> = Arc::new(HttpBackendClient::new(config.backend.clone())?);

    let sessions: Arc<dyn SessionResolver> = Arc::new(HeaderSessionResolver::new(&config.auth)?);

    let streams: Option<Arc<dyn ResumableStreamContext>> = if config.streams.resumable {
        Some(Arc::new(InMemoryStreamContext::new(Duration::from_secs(
            config.streams.retention_secs,
        ))))
    } else {
        tracing::info!("Resumable streams disabled");
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, persist, backend, sessions, streams));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
