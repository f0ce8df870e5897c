use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_queue_name")]
    pub redis_queue_name: String,
    #[serde(default = "default_dlq_name")]
    pub redis_dlq_name: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_dequeue_timeout_seconds")]
    pub dequeue_timeout_seconds: u64,
    #[serde(default = "default_consume_error_pause_seconds")]
    pub consume_error_pause_seconds: u64,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default)]
    pub from_email: String,

    #[serde(default = "default_daily_email_limit")]
    pub daily_email_limit: i64,
    #[serde(default)]
    pub alert_email: String,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|_| anyhow!("Invalid or missing environmental variable"))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            redis_queue_name: default_queue_name(),
            redis_dlq_name: default_dlq_name(),
            max_retries: default_max_retries(),
            dequeue_timeout_seconds: default_dequeue_timeout_seconds(),
            consume_error_pause_seconds: default_consume_error_pause_seconds(),
            api_port: default_api_port(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_email: String::new(),
            daily_email_limit: default_daily_email_limit(),
            alert_email: String::new(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_queue_name() -> String {
    "events:queue".to_string()
}

fn default_dlq_name() -> String {
    "events:dlq".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_dequeue_timeout_seconds() -> u64 {
    1
}

fn default_consume_error_pause_seconds() -> u64 {
    1
}

fn default_api_port() -> u16 {
    8000
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_daily_email_limit() -> i64 {
    20
}
