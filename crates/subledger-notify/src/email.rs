use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use subledger_core::EmailSettings;
use subledger_db::Channel;

use crate::error::{NotifyError, Result};
use crate::template::RenderedMessage;
use crate::Notifier;

/// Upper bound on a whole SMTP session.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends reminders through an SMTP relay with STARTTLS, logging in with the
/// configured address and password.
pub struct EmailNotifier {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(settings: &EmailSettings) -> Result<Self> {
        if settings.smtp_server.trim().is_empty() || settings.email_address.trim().is_empty() {
            return Err(NotifyError::NotConfigured("email"));
        }

        let from: Mailbox = settings.email_address.trim().parse()?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(settings.smtp_server.trim())?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.email_address.trim().to_string(),
                settings.email_password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { from, mailer })
    }

    fn build(&self, to: &str, message: &RenderedMessage) -> Result<Message> {
        let subject = message.subject.clone().unwrap_or_default();

        Message::builder()
            .from(self.from.clone())
            .to(to.trim().parse()?)
            .subject(subject)
            .multipart(MultiPart::mixed().singlepart(SinglePart::html(message.body.clone())))
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    /// Mail a short test message to the sender's own address.
    pub async fn send_test(&self) -> Result<()> {
        let message = RenderedMessage {
            subject: Some("Subscription reminders: test email".to_string()),
            body: "<p>Email reminders are configured correctly.</p>".to_string(),
        };
        let to = self.from.email.to_string();
        self.send(&to, &message).await
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, recipient: &str, message: &RenderedMessage) -> Result<()> {
        let email = self.build(recipient, message)?;
        self.mailer.send(email).await?;

        tracing::info!(to = recipient, "Email sent");
        Ok(())
    }
}
