use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    clients::EventQueue,
    config::Config,
    models::{error::ProcessError, event::Event},
    worker::{processor::NotificationProcessor, retry::RetryPolicy},
};

/// The consumer loop: block on dequeue with a bounded timeout, process one
/// event at a time, route failures through the retry policy. The dequeue
/// timeout doubles as the shutdown poll point; cancellation is observed only
/// between cycles, never mid-processing.
pub struct EventConsumer {
    queue: Arc<dyn EventQueue>,
    processor: NotificationProcessor,
    retry_policy: RetryPolicy,
    dequeue_timeout: Duration,
    error_pause: Duration,
    shutdown: CancellationToken,
}

impl EventConsumer {
    pub fn new(
        queue: Arc<dyn EventQueue>,
        processor: NotificationProcessor,
        retry_policy: RetryPolicy,
        config: &Config,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            queue,
            processor,
            retry_policy,
            dequeue_timeout: Duration::from_secs(config.dequeue_timeout_seconds),
            error_pause: Duration::from_secs(config.consume_error_pause_seconds),
            shutdown,
        }
    }

    pub async fn run(self) {
        info!("Worker started");

        while !self.shutdown.is_cancelled() {
            match self.queue.dequeue(self.dequeue_timeout).await {
                Ok(Some(event)) => self.process_event(event).await,
                Ok(None) => continue,
                Err(e) => {
                    // Transport fault on the dequeue itself: never fatal,
                    // pause briefly and keep consuming.
                    error!(error = %e, "Event dequeue failed");
                    sleep(self.error_pause).await;
                }
            }
        }

        info!("Worker stopped");
    }

    async fn process_event(&self, event: Event) {
        match self.processor.process(&event).await {
            Ok(()) => {
                info!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    "Event processed"
                );
            }
            Err(e) => self.handle_failure(event, e).await,
        }
    }

    async fn handle_failure(&self, event: Event, error: ProcessError) {
        let decision = self.retry_policy.decide(&event, &error);
        self.retry_policy.log_decision(&event, &decision, &error);

        if decision.should_retry {
            let updated = event.increment_retry();

            if let Err(e) = self.queue.enqueue(&updated).await {
                error!(
                    event_id = %updated.event_id,
                    error = %e,
                    "Failed to requeue event"
                );
            }
        } else if let Err(e) = self.queue.dead_letter(&event, &decision.reason).await {
            error!(
                event_id = %event.event_id,
                error = %e,
                "Failed to dead-letter event"
            );
        }
    }
}
