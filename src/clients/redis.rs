use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{info, warn};

use crate::{
    clients::{CounterStore, EventQueue},
    config::Config,
    models::event::{DeadLetterEntry, Event},
};

/// Redis-backed queue and counter store. Events live on a main list
/// (LPUSH/BRPOP FIFO) with a sibling dead-letter list; the daily email
/// counter uses INCR, which is atomic on the server side.
pub struct RedisClient {
    connection: MultiplexedConnection,
    queue_name: String,
    dlq_name: String,
}

impl RedisClient {
    /// Each client owns its own connection. The consumer gets a dedicated
    /// instance because BRPOP holds the connection for the full timeout.
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        println!("Connecting to Redis...");

        let client = Client::open(config.redis_url.as_str())
            .map_err(|_| anyhow!("Failed to create redis client"))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|_| anyhow!("Failed to connect to redis client"))?;

        println!("Redis connection established");

        Ok(Self {
            connection,
            queue_name: config.redis_queue_name.clone(),
            dlq_name: config.redis_dlq_name.clone(),
        })
    }

    pub async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();

        conn.llen::<_, usize>(&self.queue_name).await.is_ok()
    }
}

#[async_trait]
impl EventQueue for RedisClient {
    async fn enqueue(&self, event: &Event) -> Result<(), Error> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.connection.clone();

        conn.lpush::<_, _, ()>(&self.queue_name, payload)
            .await
            .map_err(|e| anyhow!("Failed to enqueue event: {}", e))?;

        info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            queue = %self.queue_name,
            "Event enqueued"
        );

        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<Event>, Error> {
        let mut conn = self.connection.clone();

        let result: Option<(String, String)> = conn
            .brpop(&self.queue_name, timeout.as_secs_f64())
            .await
            .map_err(|e| anyhow!("Failed to dequeue event: {}", e))?;

        let Some((_, payload)) = result else {
            return Ok(None);
        };

        let event = serde_json::from_str::<Event>(&payload)
            .map_err(|e| anyhow!("Corrupt event record in {}: {}", self.queue_name, e))?;

        info!(
            event_id = %event.event_id,
            retry_count = event.retry_count,
            "Event dequeued"
        );

        Ok(Some(event))
    }

    async fn dead_letter(&self, event: &Event, reason: &str) -> Result<(), Error> {
        let entry = DeadLetterEntry {
            event: event.clone(),
            reason: reason.to_string(),
            failed_at: Utc::now(),
        };

        let payload = serde_json::to_string(&entry)?;
        let mut conn = self.connection.clone();

        conn.lpush::<_, _, ()>(&self.dlq_name, payload)
            .await
            .map_err(|e| anyhow!("Failed to dead-letter event: {}", e))?;

        warn!(
            event_id = %event.event_id,
            retry_count = event.retry_count,
            reason,
            "Event dead-lettered"
        );

        Ok(())
    }

    async fn queue_len(&self) -> Result<usize, Error> {
        let mut conn = self.connection.clone();

        let len: usize = conn
            .llen(&self.queue_name)
            .await
            .map_err(|e| anyhow!("Failed to read queue length: {}", e))?;

        Ok(len)
    }

    async fn dlq_len(&self) -> Result<usize, Error> {
        let mut conn = self.connection.clone();

        let len: usize = conn
            .llen(&self.dlq_name)
            .await
            .map_err(|e| anyhow!("Failed to read dlq length: {}", e))?;

        Ok(len)
    }
}

#[async_trait]
impl CounterStore for RedisClient {
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> Result<i64, Error> {
        let mut conn = self.connection.clone();

        let count: i64 = conn
            .incr(key, 1)
            .await
            .map_err(|e| anyhow!("Failed to increment counter {}: {}", key, e))?;

        conn.expire::<_, ()>(key, ttl_seconds as i64)
            .await
            .map_err(|e| anyhow!("Failed to set counter expiry on {}: {}", key, e))?;

        Ok(count)
    }

    async fn get_count(&self, key: &str) -> Result<i64, Error> {
        let mut conn = self.connection.clone();

        let value: Option<i64> = conn
            .get(key)
            .await
            .map_err(|e| anyhow!("Failed to read counter {}: {}", key, e))?;

        Ok(value.unwrap_or(0))
    }
}
