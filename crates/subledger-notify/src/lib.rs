mod email;
mod error;
mod template;
mod whatsapp;

use async_trait::async_trait;
use std::sync::Arc;

use subledger_core::Settings;
use subledger_db::Channel;

pub use email::EmailNotifier;
pub use error::NotifyError;
pub use template::{RenderedMessage, email_subject, render_email, render_whatsapp};
pub use whatsapp::WhatsAppNotifier;

/// A delivery channel for rendered reminders.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    /// Deliver `message` to `recipient` (an email address or a phone number).
    async fn send(&self, recipient: &str, message: &RenderedMessage) -> error::Result<()>;

    /// False when the channel is switched on but its settings cannot deliver.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Stands in for a channel that is enabled but whose settings could not
/// build a transport. Every send fails, so each attempt still reaches the
/// notification log as `failed`.
struct Unconfigured {
    channel: Channel,
}

#[async_trait]
impl Notifier for Unconfigured {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, _recipient: &str, _message: &RenderedMessage) -> error::Result<()> {
        Err(NotifyError::NotConfigured(self.channel.as_str()))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

fn unconfigured(channel: Channel, error: NotifyError) -> Arc<dyn Notifier> {
    tracing::error!(
        %channel,
        error = %error,
        "Channel enabled but unusable; reminders will be logged as failed"
    );
    Arc::new(Unconfigured { channel })
}

/// The notifiers enabled by the current settings. A disabled channel has no
/// notifier at all.
#[derive(Clone, Default)]
pub struct Notifiers {
    pub email: Option<Arc<dyn Notifier>>,
    pub whatsapp: Option<Arc<dyn Notifier>>,
}

impl Notifiers {
    /// Build a notifier for every enabled channel. An enabled channel whose
    /// settings cannot produce a transport gets one that always fails.
    pub fn from_settings(settings: &Settings) -> Self {
        let email = if settings.email.enabled {
            match EmailNotifier::new(&settings.email) {
                Ok(notifier) => Some(Arc::new(notifier) as Arc<dyn Notifier>),
                Err(e) => Some(unconfigured(Channel::Email, e)),
            }
        } else {
            None
        };

        let whatsapp = if settings.whatsapp.enabled {
            match WhatsAppNotifier::new(&settings.whatsapp) {
                Ok(notifier) => Some(Arc::new(notifier) as Arc<dyn Notifier>),
                Err(e) => Some(unconfigured(Channel::WhatsApp, e)),
            }
        } else {
            None
        };

        Self { email, whatsapp }
    }

    pub fn get(&self, channel: Channel) -> Option<&Arc<dyn Notifier>> {
        match channel {
            Channel::Email => self.email.as_ref(),
            Channel::WhatsApp => self.whatsapp.as_ref(),
        }
    }

    /// Enabled channels in delivery order.
    pub fn enabled(&self) -> impl Iterator<Item = &Arc<dyn Notifier>> {
        self.email.iter().chain(self.whatsapp.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.whatsapp.is_none()
    }
}
