use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Error, Result};
use chrono::Local;
use tracing::warn;

use crate::clients::{CounterStore, Mailer};

/// Counter keys expire well after the day they cover so stale entries clean
/// themselves up without a cron.
const COUNTER_TTL_SECONDS: u64 = 60 * 60 * 48;

/// Daily ceiling on outbound emails, tracked in a date-scoped shared counter.
/// The counter is atomic across workers; the "alert already sent" flag is
/// process-local, so a restarted worker may re-alert on the same day.
pub struct EmailRateLimiter {
    store: Arc<dyn CounterStore>,
    daily_limit: i64,
    alert_email: Option<String>,
    alert_sent_today: AtomicBool,
}

impl EmailRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, daily_limit: i64, alert_email: Option<String>) -> Self {
        Self {
            store,
            daily_limit,
            alert_email,
            alert_sent_today: AtomicBool::new(false),
        }
    }

    fn today_key() -> String {
        format!("email:count:{}", Local::now().date_naive())
    }

    pub fn daily_limit(&self) -> i64 {
        self.daily_limit
    }

    pub async fn count_today(&self) -> Result<i64, Error> {
        self.store.get_count(&Self::today_key()).await
    }

    /// Atomically increment today's counter and refresh its expiry. Returns
    /// the new count.
    pub async fn record_sent(&self) -> Result<i64, Error> {
        self.store
            .increment_with_expiry(&Self::today_key(), COUNTER_TTL_SECONDS)
            .await
    }

    pub async fn can_send(&self) -> Result<bool, Error> {
        Ok(self.count_today().await? < self.daily_limit)
    }

    /// Notify the alert address once per day (per process) when the ceiling
    /// has been reached. Never fails: alert problems are logged and dropped.
    pub async fn alert_if_exhausted(&self, mailer: &dyn Mailer) {
        if self.alert_sent_today.load(Ordering::SeqCst) {
            return;
        }

        let count = match self.count_today().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to read daily email count for limit alert");
                return;
            }
        };

        if count < self.daily_limit {
            return;
        }

        let Some(alert_email) = &self.alert_email else {
            return;
        };

        let body = format!(
            "Daily email limit of {} has been reached.\n\n\
             Emails sent today: {}\n\
             New email requests will be queued but not sent until tomorrow.",
            self.daily_limit, count
        );

        match mailer
            .send(
                alert_email,
                "[notify-service] Daily email limit reached",
                &body,
                None,
            )
            .await
        {
            Ok(()) => {
                self.alert_sent_today.store(true, Ordering::SeqCst);
                warn!(
                    limit = self.daily_limit,
                    count,
                    alert_email = %alert_email,
                    "Daily email limit alert sent"
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to send daily limit alert");
            }
        }
    }
}
