use std::sync::Arc;

use parley_backend::BackendClient;
use parley_persist::PersistenceClient;

use crate::config::Config;
use crate::session::SessionResolver;
use crate::streaming::ResumableStreamContext;

/// Shared application state passed to all handlers
///
/// `streams` is optional: without it responses are streamed straight from
/// the reply task and cannot be resumed.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub backend: Arc<dyn BackendClient>,
    pub sessions: Arc<dyn SessionResolver>,
    pub streams: Option<Arc<dyn ResumableStreamContext>>,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: Arc<dyn PersistenceClient>,
        backend: Arc<dyn BackendClient>,
        sessions: Arc<dyn SessionResolver>,
        streams: Option<Arc<dyn ResumableStreamContext>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            persist,
            backend,
            sessions,
            streams,
        }
    }
}
