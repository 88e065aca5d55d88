use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use parley_persist::Chat;

use crate::{
    error::{ApiError, ApiResult, Surface},
    state::AppState,
};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

impl HistoryQuery {
    /// Requested page size, clamped to `1..=MAX_LIMIT`
    fn limit(&self) -> ApiResult<usize> {
        let Some(raw) = self.limit.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(DEFAULT_LIMIT);
        };

        raw.parse::<usize>()
            .map(|limit| limit.clamp(1, MAX_LIMIT))
            .map_err(|_| ApiError::bad_request(Surface::Api).with_cause("Parameter limit must be a positive integer"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub chats: Vec<Chat>,
    pub has_more: bool,
}

/// List the caller's chats, newest first
#[utoipa::path(
    get,
    path = "/history",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum number of chats to return (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Chats of the caller"),
        (status = 401, description = "Not signed in")
    ),
    tag = "chat"
)]
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let session = state
        .sessions
        .resolve(&headers)
        .await
        .ok_or_else(|| ApiError::unauthorized(Surface::Chat))?;

    let limit = query.limit()?;

    // One extra row tells us whether there is another page
    let mut chats = state.persist.list_chats(&session.user.id, limit + 1).await?;
    let has_more = chats.len() > limit;
    chats.truncate(limit);

    Ok(Json(HistoryResponse { chats, has_more }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>) -> HistoryQuery {
        HistoryQuery {
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(query(None).limit().unwrap(), DEFAULT_LIMIT);
        assert_eq!(query(Some("")).limit().unwrap(), DEFAULT_LIMIT);
        assert_eq!(query(Some("5")).limit().unwrap(), 5);
        assert_eq!(query(Some("0")).limit().unwrap(), 1);
        assert_eq!(query(Some("5000")).limit().unwrap(), MAX_LIMIT);
    }

    #[test]
    fn test_non_numeric_limit_is_bad_request() {
        assert_eq!(query(Some("abc")).limit().unwrap_err().code(), "bad_request:api");
        assert_eq!(query(Some("-3")).limit().unwrap_err().code(), "bad_request:api");
    }
}
