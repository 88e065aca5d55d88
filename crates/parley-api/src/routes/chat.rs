use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use parley_persist::{Chat, MessageRole, Visibility};

use crate::{
    error::{ApiError, ApiResult, Surface},
    state::AppState,
    streaming::{sse_response, StreamFrame, UiStreamChunk},
};

/// A finished reply younger than this is replayed to a resuming client
const RECENT_REPLY_SECS: i64 = 15;

#[derive(Debug, Deserialize)]
pub struct DeleteChatQuery {
    pub id: Option<String>,
}

fn parse_chat_id(raw: Option<&str>) -> ApiResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(Surface::Api).with_cause("Parameter id is required"))?;

    Uuid::parse_str(raw)
        .map_err(|_| ApiError::bad_request(Surface::Api).with_cause("Parameter id is not a valid chat id"))
}

/// Delete a chat with its messages and stream records
#[utoipa::path(
    delete,
    path = "/chat",
    params(
        ("id" = String, Query, description = "Chat ID")
    ),
    responses(
        (status = 200, description = "The deleted chat"),
        (status = 400, description = "Missing or invalid chat ID"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Chat missing or owned by another user")
    ),
    tag = "chat"
)]
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DeleteChatQuery>,
) -> ApiResult<Json<Chat>> {
    let chat_id = parse_chat_id(query.id.as_deref())?;

    let session = state
        .sessions
        .resolve(&headers)
        .await
        .ok_or_else(|| ApiError::unauthorized(Surface::Chat))?;

    let owned = state
        .persist
        .get_chat(chat_id)
        .await?
        .is_some_and(|chat| chat.is_owned_by(&session.user.id));
    if !owned {
        return Err(ApiError::forbidden(Surface::Chat));
    }

    let deleted = state
        .persist
        .delete_chat(chat_id)
        .await?
        .ok_or_else(|| ApiError::forbidden(Surface::Chat))?;

    tracing::info!(chat_id = %chat_id, user_id = %session.user.id, "Deleted chat");
    Ok(Json(deleted))
}

/// Reconnect to the most recent response stream of a chat
#[utoipa::path(
    get,
    path = "/chat/{id}/stream",
    params(
        ("id" = String, Path, description = "Chat ID")
    ),
    responses(
        (status = 200, description = "Resumed stream", content_type = "text/event-stream"),
        (status = 204, description = "Streams are not resumable on this server"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Private chat of another user"),
        (status = 404, description = "Chat or stream not found")
    ),
    tag = "chat"
)]
pub async fn resume_stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let Some(streams) = state.streams.as_ref() else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let chat_id = parse_chat_id(Some(&id))?;

    let session = state
        .sessions
        .resolve(&headers)
        .await
        .ok_or_else(|| ApiError::unauthorized(Surface::Chat))?;

    let chat = state
        .persist
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| ApiError::not_found(Surface::Chat))?;

    if chat.visibility == Visibility::Private && !chat.is_owned_by(&session.user.id) {
        return Err(ApiError::forbidden(Surface::Chat));
    }

    let stream_id = state
        .persist
        .list_stream_ids(chat_id)
        .await?
        .last()
        .copied()
        .ok_or_else(|| ApiError::not_found(Surface::Stream))?;

    if let Some(frames) = streams.resume_existing_stream(stream_id).await {
        tracing::info!(chat_id = %chat_id, stream_id = %stream_id, "Resuming stream");
        return Ok(sse_response(frames));
    }

    // The stream is gone; hand over a reply that finished moments ago
    let messages = state.persist.get_messages(chat_id).await?;
    let recent = messages.last().filter(|m| {
        m.role == MessageRole::Assistant
            && Utc::now() - m.created_at <= Duration::seconds(RECENT_REPLY_SECS)
    });

    let mut frames = Vec::with_capacity(2);
    if let Some(message) = recent {
        let data = serde_json::to_string(message)
            .map_err(|e| anyhow::anyhow!("Failed to serialize message: {}", e))?;
        frames.push(StreamFrame::Chunk(UiStreamChunk::AppendMessage {
            data,
            transient: true,
        }));
    }
    frames.push(StreamFrame::Done);

    tracing::debug!(
        chat_id = %chat_id,
        stream_id = %stream_id,
        replayed = recent.is_some(),
        "Stream no longer buffered"
    );
    Ok(sse_response(stream::iter(frames).boxed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_chat_id(Some(&id.to_string())).unwrap(), id);
        assert_eq!(parse_chat_id(None).unwrap_err().code(), "bad_request:api");
        assert_eq!(parse_chat_id(Some("  ")).unwrap_err().code(), "bad_request:api");
        assert_eq!(parse_chat_id(Some("nope")).unwrap_err().code(), "bad_request:api");
    }
}
