pub mod redis;
pub mod smtp;

use std::time::Duration;

use anyhow::{Error, Result};
use async_trait::async_trait;

use crate::models::{error::ProcessError, event::Event};

/// Durable event queue. Push-at-one-end/pop-at-other FIFO semantics over a
/// main list and a dead-letter list; a successful dequeue hands each item to
/// exactly one caller.
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Append an event to the tail of the main queue.
    async fn enqueue(&self, event: &Event) -> Result<(), Error>;

    /// Block up to `timeout` for the next event, FIFO relative to `enqueue`.
    /// A zero timeout blocks indefinitely. Returns `None` on timeout with no
    /// side effect. Malformed records surface as an error, never a silent
    /// drop.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<Event>, Error>;

    /// Append a `{event, reason}` record to the dead-letter list.
    async fn dead_letter(&self, event: &Event, reason: &str) -> Result<(), Error>;

    async fn queue_len(&self) -> Result<usize, Error>;

    async fn dlq_len(&self) -> Result<usize, Error>;
}

/// Shared counter store backing the daily rate limiter. The increment must be
/// atomic against concurrent callers.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> Result<i64, Error>;

    async fn get_count(&self, key: &str) -> Result<i64, Error>;
}

/// Outbound email transport. Failures surface as [`ProcessError`] values so
/// credential problems classify as permanent and connectivity problems as
/// transient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) -> Result<(), ProcessError>;
}
