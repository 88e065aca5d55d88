//! Wire format of the chat response stream.
//!
//! Each chunk goes out as one SSE `data:` line holding a JSON object tagged by
//! `type`; the stream ends with `data: [DONE]`.

pub mod resumable;

use std::convert::Infallible;

use axum::http::{header::HeaderName, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

pub use resumable::{InMemoryStreamContext, ResumableStreamContext};

pub const DONE_MARKER: &str = "[DONE]";

const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiStreamChunk {
    /// Text shown to the user
    #[serde(rename = "data-textDelta")]
    TextDelta { data: String, transient: bool },
    /// A whole stored message (JSON), sent when resuming a finished stream
    #[serde(rename = "data-appendMessage")]
    AppendMessage { data: String, transient: bool },
}

impl UiStreamChunk {
    pub fn transient_text(text: impl Into<String>) -> Self {
        UiStreamChunk::TextDelta {
            data: text.into(),
            transient: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Chunk(UiStreamChunk),
    Done,
}

impl StreamFrame {
    pub fn is_done(&self) -> bool {
        matches!(self, StreamFrame::Done)
    }
}

pub type FrameStream = BoxStream<'static, StreamFrame>;

pub fn frame_to_event(frame: StreamFrame) -> Event {
    match frame {
        StreamFrame::Chunk(chunk) => Event::default().json_data(&chunk).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize stream chunk");
            Event::default().comment("dropped chunk")
        }),
        StreamFrame::Done => Event::default().data(DONE_MARKER),
    }
}

/// Turn frames into an SSE response
pub fn sse_response(frames: FrameStream) -> Response {
    let events = frames.map(|frame| Ok::<Event, Infallible>(frame_to_event(frame)));

    (
        [
            (
                HeaderName::from_static(UI_MESSAGE_STREAM_HEADER),
                HeaderValue::from_static("v1"),
            ),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}
