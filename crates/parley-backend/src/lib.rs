pub mod config;
pub mod error;
pub mod traits;
pub mod client;

pub use config::BackendConfig;
pub use error::BackendError;
pub use traits::{BackendClient, FALLBACK_REPLY};
pub use client::{HttpBackendClient, QueryRequest, QueryResponse};
