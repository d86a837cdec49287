use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use subledger_core::{BusinessInfo, NotificationSettings, Settings};
use subledger_db::{Channel, DeliveryStatus, NewNotification, SubscriptionDb, SubscriptionView};
use subledger_notify::{Notifier, Notifiers, RenderedMessage, render_email, render_whatsapp};

use crate::error::Result;
use crate::events::{EventSink, WorkerEvent};

/// Outcome of one reminder run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub date: NaiveDate,
    pub days_before: i64,
    /// Subscriptions ending on the target day.
    pub expiring: usize,
    pub sent: usize,
    pub failed: usize,
    /// Attempts whose notification log row could not be written.
    pub unlogged: usize,
    /// Reminders are switched off in the settings; nothing was sent or logged.
    pub disabled: bool,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

/// Sends expiry reminders over every enabled channel and records each
/// attempt in the notification log.
pub struct Dispatcher {
    db: Arc<SubscriptionDb>,
    notifiers: Notifiers,
    notifications: NotificationSettings,
    business: BusinessInfo,
    events: EventSink,
}

impl Dispatcher {
    pub fn new(db: Arc<SubscriptionDb>, settings: &Settings) -> Self {
        Self::with_notifiers(db, settings, Notifiers::from_settings(settings))
    }

    pub fn with_notifiers(db: Arc<SubscriptionDb>, settings: &Settings, notifiers: Notifiers) -> Self {
        Self {
            db,
            notifiers,
            notifications: settings.notifications.clone(),
            business: settings.business.clone(),
            events: EventSink::default(),
        }
    }

    pub(crate) fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn notifiers(&self) -> &Notifiers {
        &self.notifiers
    }

    pub async fn send_expiry_notifications(&self) -> Result<DispatchReport> {
        self.send_expiry_notifications_on(subledger_db::today()).await
    }

    /// Remind every client whose subscription ends `days_before_expiry` days
    /// after `today`. Delivery failures are logged as `failed` rows and
    /// counted in the report. Once sending has begun, a log row that cannot
    /// be written is counted as `unlogged` and the run carries on; only a
    /// failure to read the expiring list is returned.
    ///
    /// Running this twice for the same day sends and logs everything twice.
    pub async fn send_expiry_notifications_on(&self, today: NaiveDate) -> Result<DispatchReport> {
        let days_before = self.notifications.days_before_expiry;
        let mut report = DispatchReport {
            date: today,
            days_before,
            expiring: 0,
            sent: 0,
            failed: 0,
            unlogged: 0,
            disabled: false,
        };

        if !self.notifications.enabled {
            tracing::info!("Expiry notifications are disabled");
            report.disabled = true;
            self.events.emit(WorkerEvent::NotificationsDisabled { date: today });
            return Ok(report);
        }

        let expiring = self.db.list_expiring_on(today, days_before).await?;
        report.expiring = expiring.len();

        tracing::info!(
            %today,
            days_before,
            expiring = expiring.len(),
            "Sending expiry notifications"
        );
        self.events.emit(WorkerEvent::DispatchStarted {
            date: today,
            days_before,
            expiring: expiring.len(),
        });

        if self.notifiers.is_empty() && !expiring.is_empty() {
            tracing::warn!("No notification channel is enabled; nothing will be sent");
        }

        for view in &expiring {
            for notifier in self.notifiers.enabled() {
                let channel = notifier.channel();
                let Some(recipient) = view.contact(channel) else {
                    tracing::debug!(client = %view.client_name, %channel, "No contact for channel");
                    continue;
                };

                let (status, message) = self.deliver(notifier.as_ref(), view, recipient).await;
                match status {
                    DeliveryStatus::Sent => report.sent += 1,
                    _ => report.failed += 1,
                }

                if let Err(e) = self.record(view, channel, status, &message, today).await {
                    tracing::error!(
                        client = %view.client_name,
                        %channel,
                        %status,
                        error = %e,
                        "Could not write notification log"
                    );
                    report.unlogged += 1;
                }
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            unlogged = report.unlogged,
            "Expiry notifications done"
        );
        self.events.emit(WorkerEvent::DispatchCompleted {
            date: today,
            sent: report.sent,
            failed: report.failed,
        });

        Ok(report)
    }

    async fn deliver(
        &self,
        notifier: &dyn Notifier,
        view: &SubscriptionView,
        recipient: &str,
    ) -> (DeliveryStatus, RenderedMessage) {
        let channel = notifier.channel();
        let message = self.render(channel, view);

        let status = match notifier.send(recipient, &message).await {
            Ok(()) => {
                self.events.emit(WorkerEvent::NotificationSent {
                    client: view.client_name.clone(),
                    service: view.service_name.clone(),
                    channel,
                });
                DeliveryStatus::Sent
            }
            Err(e) => {
                tracing::error!(
                    client = %view.client_name,
                    %channel,
                    to = recipient,
                    error = %e,
                    "Notification failed"
                );
                self.events.emit(WorkerEvent::NotificationFailed {
                    client: view.client_name.clone(),
                    service: view.service_name.clone(),
                    channel,
                    error: e.to_string(),
                });
                DeliveryStatus::Failed
            }
        };

        (status, message)
    }

    async fn record(
        &self,
        view: &SubscriptionView,
        channel: Channel,
        status: DeliveryStatus,
        message: &RenderedMessage,
        today: NaiveDate,
    ) -> Result<()> {
        self.db
            .log_notification(
                &NewNotification {
                    client_id: view.client_id,
                    service_name: &view.service_name,
                    channel,
                    status,
                    message: &message.body,
                },
                today,
            )
            .await?;
        Ok(())
    }

    fn render(&self, channel: Channel, view: &SubscriptionView) -> RenderedMessage {
        match channel {
            Channel::Email => render_email(view, &self.business),
            Channel::WhatsApp => render_whatsapp(view, &self.business),
        }
    }
}
