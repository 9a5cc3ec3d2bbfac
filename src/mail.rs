use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{info, warn};

use crate::config::MailConfig;

/// Sends plain-text mail to a single recipient.
#[async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// SMTP delivery through lettre. Without a configured host the message is
/// written to the log instead, which is enough to follow reset links locally.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid SMTP_FROM address {}", config.from))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP_HOST not set; outgoing mail will only be logged");
            None
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .with_context(|| format!("configure SMTP relay {}", config.smtp_host))?
                .port(config.smtp_port);
            let builder = match (&config.smtp_username, &config.smtp_password) {
                (Some(user), Some(pass)) => {
                    builder.credentials(Credentials::new(user.clone(), pass.clone()))
                }
                _ => builder,
            };
            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailClient for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let Some(transport) = &self.transport else {
            info!(%to, subject, body, "mail not sent (no SMTP host)");
            return Ok(());
        };

        let to_box = to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient {to}"))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to_box)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build mail message")?;
        transport.send(message).await.context("smtp send")?;
        info!(%to, subject, "mail sent");
        Ok(())
    }
}
