use chrono::NaiveDate;
use tokio::sync::mpsc;
use subledger_db::Channel;

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    NotificationsDisabled { date: NaiveDate },
    DispatchStarted { date: NaiveDate, days_before: i64, expiring: usize },
    NotificationSent { client: String, service: String, channel: Channel },
    NotificationFailed { client: String, service: String, channel: Channel, error: String },
    DispatchCompleted { date: NaiveDate, sent: usize, failed: usize },
    SchedulerStarted { send_time: String },
    SchedulerStopped,
    SchedulerError { error: String },
}

/// Non-blocking publisher for [`WorkerEvent`]s. Events are dropped when no
/// one listens or the channel is full.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink(Option<mpsc::Sender<WorkerEvent>>);

impl EventSink {
    pub(crate) fn new(tx: mpsc::Sender<WorkerEvent>) -> Self {
        Self(Some(tx))
    }

    pub(crate) fn emit(&self, event: WorkerEvent) {
        if let Some(tx) = &self.0 {
            if let Err(e) = tx.try_send(event) {
                tracing::debug!("Worker event dropped: {}", e);
            }
        }
    }
}
