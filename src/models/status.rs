use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    DeadLettered,
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            EventStatus::Queued => write!(f, "queued"),
            EventStatus::Processing => write!(f, "processing"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Failed => write!(f, "failed"),
            EventStatus::DeadLettered => write!(f, "dead_lettered"),
        }
    }
}
