//! Outbound mail transports.

use crate::{
    config::settings::SmtpSettings,
    errors::{Error, Result},
};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, info};

/// A plain-text message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Delivers mail somewhere.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message.
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

fn mail_error(err: impl std::fmt::Display) -> Error {
    Error::Mail {
        message: err.to_string(),
    }
}

/// SMTP relay mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds a pooled transport. Port 465 uses implicit TLS, any other port
    /// upgrades with STARTTLS.
    ///
    /// # Errors
    /// Returns [`Error::Mail`] if the host or sender address is invalid.
    pub fn new(smtp: &SmtpSettings, from_email: &str) -> Result<Self> {
        let builder = if smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        }
        .map_err(mail_error)?;

        let transport = builder
            .port(smtp.port)
            .credentials(Credentials::new(smtp.user.clone(), smtp.password.clone()))
            .build();
        let from = from_email.parse::<Mailbox>().map_err(mail_error)?;

        info!(host = %smtp.host, port = smtp.port, "SMTP mailer configured");
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let to = mail.to.parse::<Mailbox>().map_err(mail_error)?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(mail_error)?;

        self.transport.send(message).await.map_err(mail_error)?;
        debug!(to = %mail.to, "Mail sent");
        Ok(())
    }
}

/// Used when SMTP is not configured: logs instead of sending.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "Mail disabled, not sending");
        Ok(())
    }
}
