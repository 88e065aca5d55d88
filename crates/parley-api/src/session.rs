use async_trait::async_trait;
use axum::http::{header::HeaderName, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Guest,
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub user_type: UserType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
}

/// Works out who is calling; `None` means the caller is not signed in
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Session>;
}

/// Trusts identity headers injected by an authenticating reverse proxy
pub struct HeaderSessionResolver {
    user_header: HeaderName,
    user_type_header: HeaderName,
}

impl HeaderSessionResolver {
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        Ok(Self {
            user_header: HeaderName::from_bytes(config.user_header.to_ascii_lowercase().as_bytes())?,
            user_type_header: HeaderName::from_bytes(
                config.user_type_header.to_ascii_lowercase().as_bytes(),
            )?,
        })
    }
}

#[async_trait]
impl SessionResolver for HeaderSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Session> {
        let id = headers
            .get(&self.user_header)?
            .to_str()
            .ok()?
            .trim();
        if id.is_empty() {
            return None;
        }

        let user_type = match headers
            .get(&self.user_type_header)
            .and_then(|v| v.to_str().ok())
        {
            Some(t) if t.eq_ignore_ascii_case("guest") => UserType::Guest,
            _ => UserType::Regular,
        };

        Some(Session {
            user: SessionUser {
                id: id.to_string(),
                user_type,
            },
        })
    }
}
