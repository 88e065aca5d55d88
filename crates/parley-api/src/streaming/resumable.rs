use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use uuid::Uuid;

use super::{FrameStream, StreamFrame};

const LIVE_CHANNEL_CAPACITY: usize = 64;

/// Keeps response streams around so a client can reconnect to one
#[async_trait]
pub trait ResumableStreamContext: Send + Sync {
    /// Register `source` under `stream_id` and return a subscription to it.
    ///
    /// `source` is driven to completion even if every subscriber goes away.
    async fn resumable_stream(&self, stream_id: Uuid, source: FrameStream) -> anyhow::Result<FrameStream>;

    /// Replay a registered stream from the start and follow it to the end
    async fn resume_existing_stream(&self, stream_id: Uuid) -> Option<FrameStream>;
}

/// Per-process stream buffers; finished streams are evicted after `retention`
pub struct InMemoryStreamContext {
    streams: Arc<Mutex<HashMap<Uuid, Arc<StreamBuffer>>>>,
    retention: Duration,
}

impl InMemoryStreamContext {
    pub fn new(retention: Duration) -> Self {
        Self {
            streams: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    pub async fn active_streams(&self) -> usize {
        self.streams.lock().await.len()
    }
}

struct StreamBuffer {
    state: Mutex<BufferState>,
    live: broadcast::Sender<StreamFrame>,
}

#[derive(Default)]
struct BufferState {
    frames: Vec<StreamFrame>,
    finished: bool,
}

impl StreamBuffer {
    fn new() -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(BufferState::default()),
            live,
        }
    }

    async fn push(&self, frame: StreamFrame) {
        let mut state = self.state.lock().await;
        if state.finished {
            return;
        }
        if frame.is_done() {
            state.finished = true;
        }
        state.frames.push(frame.clone());
        // No receivers is fine; the frame is buffered for later subscribers
        let _ = self.live.send(frame);
    }

    /// Snapshot and live subscription are taken under the same lock, so a
    /// subscriber sees every frame exactly once.
    async fn subscribe(&self) -> FrameStream {
        let state = self.state.lock().await;
        let replay = state.frames.clone();
        let finished = state.finished;
        let rx = self.live.subscribe();
        drop(state);

        Box::pin(async_stream::stream! {
            let mut done = false;
            for frame in replay {
                done = frame.is_done();
                yield frame;
                if done {
                    break;
                }
            }

            if !done && !finished {
                let mut live = BroadcastStream::new(rx);
                while let Some(item) = live.next().await {
                    match item {
                        Ok(frame) => {
                            let last = frame.is_done();
                            yield frame;
                            if last {
                                break;
                            }
                        }
                        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Stream subscriber fell behind, frames dropped");
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl ResumableStreamContext for InMemoryStreamContext {
    async fn resumable_stream(&self, stream_id: Uuid, mut source: FrameStream) -> anyhow::Result<FrameStream> {
        let buffer = Arc::new(StreamBuffer::new());
        {
            let mut streams = self.streams.lock().await;
            if streams.contains_key(&stream_id) {
                anyhow::bail!("Stream {} is already registered", stream_id);
            }
            streams.insert(stream_id, Arc::clone(&buffer));
        }

        let subscription = buffer.subscribe().await;

        let streams = Arc::clone(&self.streams);
        let retention = self.retention;
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                buffer.push(frame).await;
            }
            // Source ended without a terminal frame (e.g. the producer died)
            buffer.push(StreamFrame::Done).await;
            tracing::debug!(stream_id = %stream_id, "Stream finished");

            tokio::time::sleep(retention).await;
            streams.lock().await.remove(&stream_id);
            tracing::debug!(stream_id = %stream_id, "Stream evicted");
        });

        Ok(subscription)
    }

    async fn resume_existing_stream(&self, stream_id: Uuid) -> Option<FrameStream> {
        let buffer = self.streams.lock().await.get(&stream_id).cloned()?;
        Some(buffer.subscribe().await)
    }
}
