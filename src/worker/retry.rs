use std::fmt::{Display, Formatter};

use tracing::{info, warn};

use crate::models::{
    error::{FaultKind, ProcessError},
    event::Event,
};

/// Message fragments that mark a failure as worth retrying.
const TRANSIENT_INDICATORS: [&str; 6] = [
    "timeout",
    "connection",
    "temporary",
    "unavailable",
    "retry",
    "network",
];

/// Message fragments that mark a failure as unfixable by retrying.
const PERMANENT_INDICATORS: [&str; 6] = [
    "validation",
    "invalid",
    "malformed",
    "not found",
    "unauthorized",
    "forbidden",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    Transient,
    Permanent,
    Unknown,
}

impl Display for FailureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureType::Transient => write!(f, "transient"),
            FailureType::Permanent => write!(f, "permanent"),
            FailureType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a processing failure. The message vocabulary wins over the fault
/// kind, transient indicators win over permanent ones, and anything
/// unrecognized falls to Unknown so the retry policy errs toward retrying.
pub fn classify_failure(error: &ProcessError) -> FailureType {
    let message = error.message.to_lowercase();

    if TRANSIENT_INDICATORS.iter().any(|i| message.contains(i)) {
        return FailureType::Transient;
    }

    if PERMANENT_INDICATORS.iter().any(|i| message.contains(i)) {
        return FailureType::Permanent;
    }

    match error.kind {
        FaultKind::Connection | FaultKind::Timeout | FaultKind::Io => FailureType::Transient,
        FaultKind::Value | FaultKind::Type | FaultKind::Lookup => FailureType::Permanent,
        FaultKind::Other => FailureType::Unknown,
    }
}

/// Outcome of a retry decision. Not persisted; the reason string lands in
/// logs and dead-letter records.
#[derive(Debug, Clone)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub reason: String,
}

pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Decide whether a failed event should be requeued or dead-lettered.
    /// Deterministic given `(event.retry_count, classify_failure(error))`:
    /// permanent failures bypass the retry budget entirely, exhausted budgets
    /// stop retries, everything else retries.
    pub fn decide(&self, event: &Event, error: &ProcessError) -> RetryDecision {
        let failure_type = classify_failure(error);

        if failure_type == FailureType::Permanent {
            return RetryDecision {
                should_retry: false,
                reason: format!("Permanent failure: {}: {}", error.kind, error),
            };
        }

        if event.retry_count >= self.max_retries {
            return RetryDecision {
                should_retry: false,
                reason: format!("Max retries ({}) exceeded", self.max_retries),
            };
        }

        RetryDecision {
            should_retry: true,
            reason: format!(
                "{} failure, retry {}/{}",
                failure_type,
                event.retry_count + 1,
                self.max_retries
            ),
        }
    }

    pub fn log_decision(&self, event: &Event, decision: &RetryDecision, error: &ProcessError) {
        if decision.should_retry {
            info!(
                event_id = %event.event_id,
                retry_count = event.retry_count + 1,
                max_retries = self.max_retries,
                reason = %decision.reason,
                "Retry scheduled"
            );
        } else {
            warn!(
                event_id = %event.event_id,
                retry_count = event.retry_count,
                reason = %decision.reason,
                error_kind = %error.kind,
                "Retries exhausted"
            );
        }
    }
}
