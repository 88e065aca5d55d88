use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection failure, timeout, or any other transport problem
    #[error("Backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    Decode(String),
}
