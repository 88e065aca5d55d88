use async_trait::async_trait;

use crate::error::BackendError;

/// Reply shown to the user when the backend could not produce one
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't get a response right now. Please try again later.";

/// Sends one user message to the inference backend and returns its answer
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn query(&self, message: &str) -> Result<String, BackendError>;

    /// Like [`BackendClient::query`], but any failure turns into
    /// [`FALLBACK_REPLY`]. Callers cannot tell a failure from a backend that
    /// literally answered with the fallback text.
    async fn query_or_fallback(&self, message: &str) -> String {
        match self.query(message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Backend query failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
