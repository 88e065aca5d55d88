use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, ErrorKind, Surface};
use crate::session::UserType;

/// Messages are counted over this trailing window
pub const RATE_LIMIT_WINDOW_HOURS: i64 = 24;

/// Daily message allowance per user type.
///
/// Counts are always computed; they only reject requests when `enabled`.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_guest_max")]
    pub guest_max_messages_per_day: u64,
    #[serde(default = "default_regular_max")]
    pub regular_max_messages_per_day: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            guest_max_messages_per_day: default_guest_max(),
            regular_max_messages_per_day: default_regular_max(),
        }
    }
}

fn default_guest_max() -> u64 {
    20
}

fn default_regular_max() -> u64 {
    100
}

impl RateLimitPolicy {
    pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(RATE_LIMIT_WINDOW_HOURS)
    }

    pub fn max_for(&self, user_type: UserType) -> u64 {
        match user_type {
            UserType::Guest => self.guest_max_messages_per_day,
            UserType::Regular => self.regular_max_messages_per_day,
        }
    }

    pub fn check(&self, user_type: UserType, message_count: u64) -> ApiResult<()> {
        let max = self.max_for(user_type);
        if !self.enabled {
            tracing::debug!(message_count, max, "Rate limit disabled, not enforcing");
            return Ok(());
        }
        if message_count > max {
            return Err(ApiError::new(ErrorKind::RateLimit, Surface::Chat)
                .with_cause(format!("{} messages in the last {}h", message_count, RATE_LIMIT_WINDOW_HOURS)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_policy_never_rejects() {
        let policy = RateLimitPolicy::default();
        assert!(policy.check(UserType::Guest, 10_000).is_ok());
    }

    #[test]
    fn test_enabled_policy_rejects_above_max() {
        let policy = RateLimitPolicy {
            enabled: true,
            ..RateLimitPolicy::default()
        };
        assert!(policy.check(UserType::Guest, 20).is_ok());
        let err = policy.check(UserType::Guest, 21).unwrap_err();
        assert_eq!(err.code(), "rate_limit:chat");
        assert!(policy.check(UserType::Regular, 21).is_ok());
    }
}
