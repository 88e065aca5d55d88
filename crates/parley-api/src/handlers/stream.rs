use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::ToSchema;
use uuid::Uuid;

use parley_backend::{BackendClient, FALLBACK_REPLY};
use parley_persist::{
    save_assistant_reply, title_from_text, Chat, Message, MessagePart, MessageRole,
    PersistenceClient, StreamRecord, Visibility,
};

use crate::{
    error::{ApiError, ApiResult, Surface},
    hints::RequestHints,
    rate_limit::RateLimitPolicy,
    state::AppState,
    streaming::{sse_response, FrameStream, StreamFrame, UiStreamChunk},
};

const MAX_TEXT_CHARS: usize = 2000;
const MAX_FILE_NAME_CHARS: usize = 100;
const ALLOWED_MEDIA_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

const REPLY_CHANNEL_CAPACITY: usize = 16;

/// Sent instead of a reply when the message carries no text
pub const EMPTY_MESSAGE_NOTICE: &str = "Please enter a message to get a response.";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostChatRequest {
    pub id: Uuid,
    pub message: IncomingMessage,
    pub selected_chat_model: ChatModel,
    #[schema(value_type = String, example = "private")]
    pub selected_visibility_type: Visibility,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IncomingMessage {
    pub id: Uuid,
    #[schema(value_type = String, example = "user")]
    pub role: MessageRole,
    #[schema(value_type = Vec<Object>)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub enum ChatModel {
    #[serde(rename = "chat-model")]
    Default,
    #[serde(rename = "chat-model-reasoning")]
    Reasoning,
}

impl PostChatRequest {
    pub fn parse(body: &[u8]) -> ApiResult<Self> {
        let request: PostChatRequest = serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request(Surface::Api).with_cause(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> ApiResult<()> {
        let invalid = |cause: String| Err(ApiError::bad_request(Surface::Api).with_cause(cause));

        if self.message.role != MessageRole::User {
            return invalid("message.role must be \"user\"".to_string());
        }

        for part in &self.message.parts {
            match part {
                MessagePart::Text { text } => {
                    let len = text.chars().count();
                    if len == 0 || len > MAX_TEXT_CHARS {
                        return invalid(format!("text parts must be 1..={} characters", MAX_TEXT_CHARS));
                    }
                }
                MessagePart::File { media_type, name, url } => {
                    if !ALLOWED_MEDIA_TYPES.contains(&media_type.as_str()) {
                        return invalid(format!("unsupported media type {}", media_type));
                    }
                    let len = name.chars().count();
                    if len == 0 || len > MAX_FILE_NAME_CHARS {
                        return invalid(format!("file names must be 1..={} characters", MAX_FILE_NAME_CHARS));
                    }
                    if !is_http_url(url) {
                        return invalid("file url must be an absolute http(s) URL".to_string());
                    }
                }
            }
        }

        Ok(())
    }

    /// First text part, untouched
    pub fn first_text(&self) -> &str {
        self.message
            .parts
            .iter()
            .find_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }
}

fn is_http_url(url: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
}

/// Send a message and stream the reply using Server-Sent Events
#[utoipa::path(
    post,
    path = "/chat",
    request_body = PostChatRequest,
    responses(
        (status = 200, description = "Streaming response", content_type = "text/event-stream"),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Chat belongs to another user"),
        (status = 429, description = "Daily message limit reached"),
        (status = 503, description = "Unexpected failure")
    ),
    tag = "chat"
)]
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    // 1. Parse and validate before touching anything else
    let req = PostChatRequest::parse(&body)?;

    // 2. Resolve the caller
    let session = state
        .sessions
        .resolve(&headers)
        .await
        .ok_or_else(|| ApiError::unauthorized(Surface::Chat))?;
    let user_id = session.user.id.as_str();

    // 3. Rate-limit counters
    let message_count = state
        .persist
        .count_user_messages_since(user_id, RateLimitPolicy::window_start(Utc::now()))
        .await?;
    state
        .config
        .rate_limit
        .check(session.user.user_type, message_count)?;

    // 4. Load or create the chat
    match state.persist.get_chat(req.id).await? {
        Some(chat) => {
            if !chat.is_owned_by(user_id) {
                return Err(ApiError::forbidden(Surface::Chat));
            }
        }
        None => {
            let chat = Chat::new(
                req.id,
                user_id,
                title_from_text(req.first_text()),
                req.selected_visibility_type,
            );
            state.persist.save_chat(chat).await?;
            tracing::info!(chat_id = %req.id, user_id, "Created chat");
        }
    }

    // 5. History and request hints; not forwarded to the backend
    let mut history = state.persist.get_messages(req.id).await?;
    let user_message = Message::user(req.message.id, req.id, req.message.parts.clone());
    history.push(user_message.clone());
    let hints = RequestHints::from_headers(&headers);
    tracing::debug!(
        chat_id = %req.id,
        history_len = history.len(),
        model = ?req.selected_chat_model,
        hints = ?hints,
        "Prepared chat context"
    );

    // 6. Save the user message
    state.persist.save_messages(vec![user_message]).await?;

    // 7. Register the stream
    let record = StreamRecord::new(req.id);
    let stream_id = record.id;
    state.persist.create_stream_record(record).await?;

    // 8. Produce the reply in the background
    let user_text = req.first_text().trim().to_string();
    let receiver = spawn_reply(
        Arc::clone(&state.backend),
        Arc::clone(&state.persist),
        req.id,
        user_text,
    );
    let frames: FrameStream = ReceiverStream::new(receiver).boxed();

    // 9. Make it resumable when a stream context is configured
    let frames = match &state.streams {
        Some(streams) => streams.resumable_stream(stream_id, frames).await?,
        None => frames,
    };

    tracing::info!(chat_id = %req.id, stream_id = %stream_id, "Streaming reply");
    Ok(sse_response(frames))
}

/// Spawn the reply task, return the receiving end of its frames
///
/// The task keeps running when the client disconnects, so the reply is
/// persisted either way. It always finishes with [`StreamFrame::Done`].
pub fn spawn_reply(
    backend: Arc<dyn BackendClient>,
    persist: Arc<dyn PersistenceClient>,
    chat_id: Uuid,
    user_text: String,
) -> mpsc::Receiver<StreamFrame> {
    let (tx, rx) = mpsc::channel(REPLY_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        run_reply(backend.as_ref(), persist.as_ref(), chat_id, &user_text, &tx).await;
        let _ = tx.send(StreamFrame::Done).await;
    });

    rx
}

async fn run_reply(
    backend: &dyn BackendClient,
    persist: &dyn PersistenceClient,
    chat_id: Uuid,
    user_text: &str,
    tx: &mpsc::Sender<StreamFrame>,
) {
    if user_text.is_empty() {
        let _ = tx
            .send(StreamFrame::Chunk(UiStreamChunk::transient_text(EMPTY_MESSAGE_NOTICE)))
            .await;
        return;
    }

    let (reply, label) = match backend.query(user_text).await {
        Ok(reply) => (reply, "success"),
        Err(e) => {
            tracing::warn!(chat_id = %chat_id, error = %e, "Backend query failed, sending fallback reply");
            (FALLBACK_REPLY.to_string(), "error")
        }
    };

    if tx
        .send(StreamFrame::Chunk(UiStreamChunk::transient_text(reply.clone())))
        .await
        .is_err()
    {
        tracing::debug!(chat_id = %chat_id, "Client went away before the reply was sent");
    }

    if let Err(e) = save_assistant_reply(persist, chat_id, &reply, label).await {
        tracing::error!(chat_id = %chat_id, error = %e, "Failed to save assistant message");
    }
}
