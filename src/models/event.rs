use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::status::EventStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    UserNotification,
    SystemAlert,
    EmailNotification,
    SmsNotification,
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::UserNotification => write!(f, "USER_NOTIFICATION"),
            EventType::SystemAlert => write!(f, "SYSTEM_ALERT"),
            EventType::EmailNotification => write!(f, "EMAIL_NOTIFICATION"),
            EventType::SmsNotification => write!(f, "SMS_NOTIFICATION"),
        }
    }
}

/// Payload accepted by the ingestion API. Validation of `user_id` happens at
/// the API boundary before an `Event` is built from this.
#[derive(Debug, Clone, Deserialize)]
pub struct EventCreate {
    pub user_id: String,
    pub event_type: EventType,

    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub event_id: String,
    pub status: EventStatus,
    pub queued_at: DateTime<Utc>,
}

/// Internal unit of queued work. Immutable once created; a retry produces a
/// new value via [`Event::increment_retry`], never an in-place update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub user_id: String,

    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(default = "default_version")]
    pub version: String,
}

impl Event {
    pub fn new(
        event_type: EventType,
        user_id: String,
        payload: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            user_id,
            payload,
            created_at: Utc::now(),
            retry_count: 0,
            version: default_version(),
        }
    }

    /// Returns a new Event identical to this one with `retry_count + 1`.
    pub fn increment_retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    pub fn to_response(&self) -> EventResponse {
        EventResponse {
            event_id: self.event_id.to_string(),
            status: EventStatus::Queued,
            queued_at: self.created_at,
        }
    }
}

/// Dead-letter record: the failed event wrapped with the reason it was
/// rejected and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub event: Event,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

fn default_version() -> String {
    "1.0".to_string()
}
