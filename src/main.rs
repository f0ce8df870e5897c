use std::sync::Arc;

use anyhow::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use notify_service::{
    api::run_api_server,
    clients::{Mailer, redis::RedisClient, smtp::SmtpMailer},
    config::Config,
    worker::{
        consumer::EventConsumer, processor::NotificationProcessor, rate_limit::EmailRateLimiter,
        retry::RetryPolicy,
    },
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!(
        queue = %config.redis_queue_name,
        max_retries = config.max_retries,
        daily_email_limit = config.daily_email_limit,
        "Starting notification service"
    );

    // Cannot reach the queue at startup: fatal, exits non-zero. The API and
    // the consumer each get their own connection because the consumer's
    // BRPOP holds its connection for the full dequeue timeout.
    let api_redis = Arc::new(RedisClient::connect(&config).await?);
    let worker_redis = Arc::new(RedisClient::connect(&config).await?);

    let mailer: Option<Arc<dyn Mailer>> = match SmtpMailer::from_config(&config)? {
        Some(mailer) => Some(Arc::new(mailer)),
        None => {
            warn!("SMTP credentials not configured, notifications will be logged only");
            None
        }
    };

    let alert_email = if config.alert_email.is_empty() {
        None
    } else {
        Some(config.alert_email.clone())
    };

    let rate_limiter = EmailRateLimiter::new(
        worker_redis.clone(),
        config.daily_email_limit,
        alert_email,
    );
    let processor = NotificationProcessor::new(mailer, rate_limiter);
    let retry_policy = RetryPolicy::new(config.max_retries);

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    let consumer = EventConsumer::new(
        worker_redis,
        processor,
        retry_policy,
        &config,
        shutdown.clone(),
    );

    let api_handle = tokio::spawn(run_api_server(config, api_redis, shutdown));

    consumer.run().await;

    api_handle.await??;

    info!("Notification service stopped");

    Ok(())
}

fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        shutdown.cancel();
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
