use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub queue_length: usize,
    pub dlq_length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
