//! Notification side-channel.
//!
//! Request handlers publish [`Notification`]s after their database work has
//! committed. Publishing never waits and never fails the caller: events go
//! into a bounded queue drained by a single background worker that turns them
//! into mail. A full or closed queue drops the event with a warning.

pub mod mailer;

pub use mailer::{LogMailer, Mailer, OutgoingMail, SmtpMailer};

use crate::entities::contact::{self, ContactKind};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, instrument, warn};

/// Queue size used by `main`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Something staff or a user should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A contact or franchise inquiry was stored
    ContactReceived(contact::Model),
    /// A staff member signed in
    AdminLogin {
        /// Account that signed in
        username: String,
        /// Where to send the notice
        email: String,
        /// When the login happened
        at: DateTime<Utc>,
    },
}

impl Notification {
    /// Builds the mail for this event. `inbox` receives contact notices;
    /// without one those events produce no mail.
    #[must_use]
    pub fn to_mail(&self, inbox: Option<&str>) -> Option<OutgoingMail> {
        match self {
            Self::ContactReceived(contact) => {
                let to = inbox?.to_string();
                let subject = match contact.kind {
                    ContactKind::Franchise => format!("New franchise enquiry from {}", contact.name),
                    ContactKind::General => format!("New contact message from {}", contact.name),
                };
                let body = format!(
                    "Name: {}\nEmail: {}\nPhone: {}\nReceived: {}\n\n{}",
                    contact.name,
                    contact.email,
                    contact.phone,
                    contact.created_at.format("%Y-%m-%d %H:%M UTC"),
                    contact.message
                );
                Some(OutgoingMail { to, subject, body })
            }
            Self::AdminLogin {
                username,
                email,
                at,
            } => Some(OutgoingMail {
                to: email.clone(),
                subject: "New sign-in to the admin panel".to_string(),
                body: format!(
                    "Hello {username},\n\nYour account signed in at {}.\n\
                     If this was not you, change your password immediately.",
                    at.format("%Y-%m-%d %H:%M UTC")
                ),
            }),
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::ContactReceived(_) => "contact_received",
            Self::AdminLogin { .. } => "admin_login",
        }
    }
}

/// Cloneable publishing handle.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Starts the worker on the current runtime and returns the handle
    /// together with the worker's join handle.
    ///
    /// The worker stops once every `Notifier` clone is dropped.
    #[must_use]
    pub fn spawn(
        mailer: Arc<dyn Mailer>,
        inbox: Option<String>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (notifier, receiver) = Self::channel(capacity);
        let worker = NotificationWorker {
            receiver,
            mailer,
            inbox,
        };
        (notifier, tokio::spawn(worker.run()))
    }

    /// A handle with no worker; the caller owns the receiving end.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queues an event without waiting.
    pub fn publish(&self, event: Notification) {
        let kind = event.kind();
        match self.sender.try_send(event) {
            Ok(()) => debug!(kind, "Notification queued"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind, "Notification queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(kind, "Notification worker stopped, dropping event");
            }
        }
    }
}

struct NotificationWorker {
    receiver: mpsc::Receiver<Notification>,
    mailer: Arc<dyn Mailer>,
    inbox: Option<String>,
}

impl NotificationWorker {
    #[instrument(name = "notification_worker", skip(self))]
    async fn run(mut self) {
        info!("Notification worker starting");
        while let Some(event) = self.receiver.recv().await {
            let Some(mail) = event.to_mail(self.inbox.as_deref()) else {
                debug!(kind = event.kind(), "No recipient for notification");
                continue;
            };
            if let Err(e) = self.mailer.send(&mail).await {
                warn!(kind = event.kind(), error = %e, "Failed to deliver notification");
            }
        }
        info!("Notification worker stopped");
    }
}
