use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::{
    clients::Mailer,
    config::Config,
    models::error::{FaultKind, ProcessError},
};

/// SMTP transport over STARTTLS. Built only when credentials are configured;
/// without them the processor treats email dispatch as a logged no-op.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Option<Self>, Error> {
        if config.smtp_user.is_empty() || config.smtp_password.is_empty() {
            return Ok(None);
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Some(Self {
            transport,
            from_email: config.from_email.clone(),
        }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) -> Result<(), ProcessError> {
        let from = self.from_email.parse::<Mailbox>().map_err(|e| {
            ProcessError::new(
                FaultKind::Value,
                format!("invalid sender address '{}': {}", self.from_email, e),
            )
        })?;

        let to = to_email.parse::<Mailbox>().map_err(|e| {
            ProcessError::new(
                FaultKind::Value,
                format!("invalid recipient address '{}': {}", to_email, e),
            )
        })?;

        let builder = Message::builder().from(from).to(to).subject(subject);

        let message = match html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                body.to_string(),
                html.to_string(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(body.to_string()),
        }
        .map_err(|e| {
            ProcessError::new(FaultKind::Value, format!("invalid email message: {}", e))
        })?;

        self.transport
            .send(message)
            .await
            .map_err(map_smtp_error)?;

        info!(to = %to_email, subject, "Email sent");

        Ok(())
    }
}

/// Authentication and policy rejections (5xx) must classify as permanent,
/// server backoff (4xx) and connectivity problems as transient.
fn map_smtp_error(error: lettre::transport::smtp::Error) -> ProcessError {
    if error.is_permanent() {
        ProcessError::new(
            FaultKind::Value,
            format!("smtp request rejected: invalid credentials or recipient: {}", error),
        )
    } else if error.is_transient() {
        ProcessError::new(
            FaultKind::Io,
            format!("smtp temporary failure: {}", error),
        )
    } else {
        ProcessError::new(
            FaultKind::Connection,
            format!("smtp connection failed: {}", error),
        )
    }
}
