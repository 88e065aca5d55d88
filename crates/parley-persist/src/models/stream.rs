use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Links one response stream to the chat it was produced for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl StreamRecord {
    pub fn new(chat_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id,
            created_at: Utc::now(),
        }
    }
}
