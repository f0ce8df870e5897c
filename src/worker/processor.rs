use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    clients::Mailer,
    models::{error::ProcessError, event::Event},
    worker::rate_limit::EmailRateLimiter,
};

/// Sends the email for a notification event, gated by the daily rate limiter.
///
/// Missing routing info, missing SMTP credentials, and a reached rate limit
/// are operational states, not processing failures: they log and return Ok so
/// the event counts as handled. Only the send itself may fail into the retry
/// path.
pub struct NotificationProcessor {
    mailer: Option<Arc<dyn Mailer>>,
    rate_limiter: EmailRateLimiter,
}

impl NotificationProcessor {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, rate_limiter: EmailRateLimiter) -> Self {
        Self {
            mailer,
            rate_limiter,
        }
    }

    pub async fn process(&self, event: &Event) -> Result<(), ProcessError> {
        info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            user_id = %event.user_id,
            "Processing notification event"
        );

        let to_email = event
            .payload
            .get("to_email")
            .or_else(|| event.payload.get("email"))
            .and_then(|v| v.as_str());

        let message = event
            .payload
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("You have a new notification!");

        let subject = event
            .payload
            .get("subject")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Notification: {}", event.event_type));

        let Some(to_email) = to_email else {
            warn!(
                event_id = %event.event_id,
                "No email address in payload, logging notification only"
            );
            info!(
                event_id = %event.event_id,
                user_id = %event.user_id,
                message,
                "Notification logged without delivery"
            );
            return Ok(());
        };

        let Some(mailer) = &self.mailer else {
            warn!(
                event_id = %event.event_id,
                "SMTP not configured, skipping email delivery"
            );
            return Ok(());
        };

        let can_send = match self.rate_limiter.can_send().await {
            Ok(can_send) => can_send,
            Err(e) => {
                warn!(
                    event_id = %event.event_id,
                    error = %e,
                    "Daily limit check failed, proceeding with send"
                );
                true
            }
        };

        if !can_send {
            warn!(
                event_id = %event.event_id,
                limit = self.rate_limiter.daily_limit(),
                to_email,
                "Daily email limit reached, skipping send"
            );
            self.rate_limiter.alert_if_exhausted(mailer.as_ref()).await;
            return Ok(());
        }

        let body = format!("Notification for {}: {}", event.user_id, message);
        let html_body = build_html_body(event, message);

        mailer
            .send(to_email, &subject, &body, Some(&html_body))
            .await?;

        match self.rate_limiter.record_sent().await {
            Ok(count) => {
                info!(
                    event_id = %event.event_id,
                    user_id = %event.user_id,
                    to_email,
                    daily_count = count,
                    daily_limit = self.rate_limiter.daily_limit(),
                    "Notification email sent"
                );
            }
            Err(e) => {
                warn!(
                    event_id = %event.event_id,
                    error = %e,
                    "Email sent but daily count update failed"
                );
            }
        }

        Ok(())
    }
}

fn build_html_body(event: &Event, message: &str) -> String {
    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; padding: 20px;">
    <h2 style="color: #333;">Notification</h2>
    <p><strong>User ID:</strong> {}</p>
    <p><strong>Type:</strong> {}</p>
    <p><strong>Message:</strong> {}</p>
    <hr>
    <p style="color: #666; font-size: 12px;">
        Event ID: {}<br>
        Sent at: {}
    </p>
</body>
</html>"#,
        event.user_id,
        event.event_type,
        message,
        event.event_id,
        Utc::now().to_rfc3339()
    )
}
