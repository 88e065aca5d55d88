#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;
use uuid::Uuid;

use parley_api::{
    config::Config,
    router::build_router,
    session::{HeaderSessionResolver, SessionResolver},
    state::AppState,
    streaming::{InMemoryStreamContext, ResumableStreamContext},
};
use parley_backend::{BackendClient, BackendError};
use parley_persist::{InMemoryPersistence, PersistenceClient};

/// Backend double: echoes with a prefix, or fails with a status
pub struct FakeBackend {
    reply: Result<String, u16>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    last_message: Mutex<Option<String>>,
}

impl FakeBackend {
    fn with_reply(reply: Result<String, u16>) -> Self {
        Self {
            reply,
            gate: None,
            calls: AtomicUsize::new(0),
            last_message: Mutex::new(None),
        }
    }

    pub fn echo(prefix: &str) -> Self {
        Self::with_reply(Ok(prefix.to_string()))
    }

    pub fn failing(status: u16) -> Self {
        Self::with_reply(Err(status))
    }

    /// Echo backend that holds every reply until the returned gate is notified
    pub fn gated(prefix: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let backend = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::echo(prefix)
        };
        (backend, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_message(&self) -> Option<String> {
        self.last_message.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn query(&self, message: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock().unwrap() = Some(message.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reply {
            Ok(prefix) => Ok(format!("{}{}", prefix, message)),
            Err(status) => Err(BackendError::Status {
                status: *status,
                body: "backend exploded".to_string(),
            }),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub persist: Arc<InMemoryPersistence>,
    pub backend: Arc<FakeBackend>,
}

impl TestApp {
    /// Default config, echoing backend, streams resumable for a minute
    pub fn new() -> Self {
        Self::build(Config::default(), FakeBackend::echo("You said: "), Some(Duration::from_secs(60)))
    }

    pub fn with_backend(backend: FakeBackend) -> Self {
        Self::build(Config::default(), backend, Some(Duration::from_secs(60)))
    }

    pub fn build(config: Config, backend: FakeBackend, retention: Option<Duration>) -> Self {
        let persist = Arc::new(InMemoryPersistence::new());
        let backend = Arc::new(backend);
        let sessions: Arc<dyn SessionResolver> = Arc::new(HeaderSessionResolver::new(&config.auth).unwrap());
        let streams = retention
            .map(|r| Arc::new(InMemoryStreamContext::new(r)) as Arc<dyn ResumableStreamContext>);

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&persist) as Arc<dyn PersistenceClient>,
            Arc::clone(&backend) as Arc<dyn BackendClient>,
            sessions,
            streams,
        ));

        Self {
            router: build_router(state),
            persist,
            backend,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_chat(&self, user: Option<&str>, body: &Value) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get(&self, user: Option<&str>, uri: &str) -> Response<Body> {
        self.request(user, "GET", uri).await
    }

    pub async fn delete(&self, user: Option<&str>, uri: &str) -> Response<Body> {
        self.request(user, "DELETE", uri).await
    }

    async fn request(&self, user: Option<&str>, method: &str, uri: &str) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub fn chat_request(chat_id: Uuid, text: &str) -> Value {
    json!({
        "id": chat_id,
        "message": {
            "id": Uuid::new_v4(),
            "role": "user",
            "parts": [{"type": "text", "text": text}]
        },
        "selectedChatModel": "chat-model",
        "selectedVisibilityType": "private"
    })
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// The `data:` payloads of an SSE body, in order
pub fn sse_data(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start().to_string())
        .collect()
}
