//! Mailer that writes messages to the log instead of sending them.

use async_trait::async_trait;
use quill_core::ports::{MailError, Mailer, OutgoingMail};

/// Logs every message at info level. Used until an SMTP relay is wired in,
/// and in development where the reset link is read straight from the logs.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.body,
            "Outgoing mail"
        );
        Ok(())
    }
}
