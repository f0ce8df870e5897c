use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Coarse fault category attached to a processing error. The classifier in
/// `worker::retry` falls back to this when the error message matches no known
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Connection,
    Timeout,
    Io,
    Value,
    Type,
    Lookup,
    Other,
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::Connection => write!(f, "connection"),
            FaultKind::Timeout => write!(f, "timeout"),
            FaultKind::Io => write!(f, "io"),
            FaultKind::Value => write!(f, "value"),
            FaultKind::Type => write!(f, "type"),
            FaultKind::Lookup => write!(f, "lookup"),
            FaultKind::Other => write!(f, "other"),
        }
    }
}

/// Structured processing failure raised by the notification pipeline. Carries
/// a kind and a message so retry decisions stay independent of any concrete
/// transport error type.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProcessError {
    pub kind: FaultKind,
    pub message: String,
}

impl ProcessError {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Other, message)
    }
}
