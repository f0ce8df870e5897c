use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, timeout};

use notify_service::{
    clients::EventQueue,
    models::{
        error::{FaultKind, ProcessError},
        event::EventType,
    },
};

use crate::support::{TestWorkerOptions, spawn_worker, test_event};

const WAIT: Duration = Duration::from_secs(5);

/// Test: A transient failure requeues the event with an incremented retry count
#[tokio::test]
async fn test_transient_failure_requeues_event() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions::default()).await;

    worker.mailer.fail_once(ProcessError::new(
        FaultKind::Connection,
        "connection timeout while sending",
    ));

    let event = test_event(
        EventType::EmailNotification,
        "user-1",
        &[("to_email", "someone@example.com")],
    );
    worker.queue.enqueue(&event).await?;

    // Second attempt succeeds, so exactly one email lands.
    assert!(
        crate::support::wait_until(WAIT, || worker.mailer.sent().len() == 1).await,
        "email never sent"
    );

    let enqueued = worker.queue.enqueue_log();

    assert_eq!(enqueued.len(), 2, "expected original enqueue plus one requeue");
    assert_eq!(enqueued[1].event_id, event.event_id);
    assert_eq!(enqueued[1].retry_count, 1);
    assert!(worker.queue.dead_letters().is_empty());

    worker.stop().await;

    Ok(())
}

/// Test: Exhausted retry budget dead-letters the event
#[tokio::test]
async fn test_retry_budget_exhaustion_dead_letters() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions::default()).await;

    worker.mailer.fail_always(ProcessError::new(
        FaultKind::Connection,
        "connection refused",
    ));

    let mut event = test_event(
        EventType::EmailNotification,
        "user-2",
        &[("to_email", "someone@example.com")],
    );
    event.retry_count = 3;
    worker.queue.enqueue(&event).await?;

    assert!(
        crate::support::wait_until(WAIT, || worker.queue.dead_letters().len() == 1).await,
        "event never dead-lettered"
    );

    let dead = worker.queue.dead_letters();

    assert_eq!(dead[0].event.event_id, event.event_id);
    assert_eq!(dead[0].event.retry_count, 3);
    assert_eq!(dead[0].reason, "Max retries (3) exceeded");
    // No requeue happened: the only enqueue on record is the original one.
    assert_eq!(worker.queue.enqueue_log().len(), 1);
    assert!(worker.queue.is_empty());

    worker.stop().await;

    Ok(())
}

/// Test: Permanent failures dead-letter immediately, bypassing the budget
#[tokio::test]
async fn test_permanent_failure_dead_letters_immediately() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions::default()).await;

    worker
        .mailer
        .fail_always(ProcessError::other("validation error: bad recipient"));

    let event = test_event(
        EventType::EmailNotification,
        "user-3",
        &[("to_email", "someone@example.com")],
    );
    worker.queue.enqueue(&event).await?;

    assert!(
        crate::support::wait_until(WAIT, || worker.queue.dead_letters().len() == 1).await,
        "event never dead-lettered"
    );

    let dead = worker.queue.dead_letters();

    assert_eq!(dead[0].event.retry_count, 0);
    assert!(dead[0].reason.starts_with("Permanent failure"));
    assert_eq!(worker.queue.enqueue_log().len(), 1);

    worker.stop().await;

    Ok(())
}

/// Test: At the daily ceiling the processor skips sends and alerts once
#[tokio::test]
async fn test_rate_limit_skips_send_and_alerts_once() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions {
        daily_email_limit: 20,
        sent_today: 20,
        alert_email: Some("admin@example.com".to_string()),
        ..TestWorkerOptions::default()
    })
    .await;

    for user_id in ["user-4", "user-5"] {
        let event = test_event(
            EventType::EmailNotification,
            user_id,
            &[("to_email", "someone@example.com")],
        );
        worker.queue.enqueue(&event).await?;
    }

    assert!(
        crate::support::wait_until(WAIT, || {
            worker.queue.is_empty() && worker.mailer.sent().len() == 1
        })
        .await,
        "events never drained or alert missing"
    );

    // A moment later there is still exactly one alert and nothing else sent.
    sleep(Duration::from_millis(200)).await;

    let sent = worker.mailer.sent();

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "admin@example.com");
    assert!(worker.queue.dead_letters().is_empty());

    worker.stop().await;

    Ok(())
}

/// Test: Events without a destination address are consumed without sending
#[tokio::test]
async fn test_missing_address_is_a_no_op() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions::default()).await;

    let event = test_event(
        EventType::UserNotification,
        "user-6",
        &[("message", "hello")],
    );
    worker.queue.enqueue(&event).await?;

    assert!(
        crate::support::wait_until(WAIT, || worker.queue.is_empty()).await,
        "event never consumed"
    );
    sleep(Duration::from_millis(100)).await;

    assert!(worker.mailer.sent().is_empty());
    assert!(worker.queue.dead_letters().is_empty());
    assert_eq!(worker.queue.enqueue_log().len(), 1);

    worker.stop().await;

    Ok(())
}

/// Test: Without SMTP credentials events are consumed without sending
#[tokio::test]
async fn test_unconfigured_smtp_is_a_no_op() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions {
        smtp_configured: false,
        ..TestWorkerOptions::default()
    })
    .await;

    let event = test_event(
        EventType::EmailNotification,
        "user-7",
        &[("to_email", "someone@example.com")],
    );
    worker.queue.enqueue(&event).await?;

    assert!(
        crate::support::wait_until(WAIT, || worker.queue.is_empty()).await,
        "event never consumed"
    );
    sleep(Duration::from_millis(100)).await;

    assert!(worker.mailer.sent().is_empty());
    assert!(worker.queue.dead_letters().is_empty());
    assert_eq!(worker.queue.enqueue_log().len(), 1);

    worker.stop().await;

    Ok(())
}

/// Test: A corrupt queue record pauses the loop without killing it
#[tokio::test]
async fn test_corrupt_record_self_heals() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions::default()).await;

    worker.queue.push_raw("not valid json");

    let event = test_event(
        EventType::EmailNotification,
        "user-8",
        &[("to_email", "someone@example.com")],
    );
    worker.queue.enqueue(&event).await?;

    // The bad record is dropped with a logged error and a pause; the valid
    // event behind it still gets processed.
    assert!(
        crate::support::wait_until(WAIT, || worker.mailer.sent().len() == 1).await,
        "worker did not recover from corrupt record"
    );

    assert!(worker.queue.dead_letters().is_empty());

    worker.stop().await;

    Ok(())
}

/// Test: Cancellation stops the loop between cycles
#[tokio::test]
async fn test_shutdown_is_observed() -> Result<()> {
    let worker = spawn_worker(TestWorkerOptions::default()).await;

    timeout(WAIT, worker.stop())
        .await
        .expect("worker did not stop after cancellation");

    Ok(())
}
