use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use subledger_core::NotificationSettings;
use subledger_db::SubscriptionDb;

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::Result;
use crate::events::{EventSink, WorkerEvent};

/// Key of the daily reminder job in the `scheduler_state` table.
pub const EXPIRY_JOB: &str = "expiry_notifications";

pub const TICK: Duration = Duration::from_secs(60);

/// The daily run is due once the local clock has reached `send_time` and no
/// run has completed yet on that calendar day.
pub fn is_due(now: NaiveDateTime, send_time: NaiveTime, last_run: Option<NaiveDate>) -> bool {
    now.time() >= send_time && last_run != Some(now.date())
}

/// Runs the dispatcher once per day at the configured local time. The date
/// of the last successful run is stored in the database, so a restart on the
/// same day does not send twice and a restart after the send time still
/// sends that day.
///
/// The run date is also held in memory, so a day whose reminders went out
/// is never repeated by this process even if the date cannot be stored.
pub struct Scheduler {
    db: Arc<SubscriptionDb>,
    dispatcher: Arc<Dispatcher>,
    send_time: NaiveTime,
    ran_on: Mutex<Option<NaiveDate>>,
    events: EventSink,
}

impl Scheduler {
    pub fn new(
        db: Arc<SubscriptionDb>,
        dispatcher: Arc<Dispatcher>,
        notifications: &NotificationSettings,
    ) -> Result<Self> {
        Ok(Self {
            db,
            dispatcher,
            send_time: notifications.send_time()?,
            ran_on: Mutex::new(None),
            events: EventSink::default(),
        })
    }

    pub(crate) fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn send_time(&self) -> NaiveTime {
        self.send_time
    }

    pub async fn last_run(&self) -> Result<Option<NaiveDate>> {
        Ok(self.db.last_run_date(EXPIRY_JOB).await?)
    }

    /// Evaluate the schedule at `now` and dispatch if due. Returns the report
    /// of the run, if one happened.
    ///
    /// Once the dispatcher has returned a report the day counts as done,
    /// even when storing the run date fails afterwards.
    pub async fn tick_once(&self, now: NaiveDateTime) -> Result<Option<DispatchReport>> {
        let mut ran_on = self.ran_on.lock().await;
        if !is_due(now, self.send_time, *ran_on) {
            return Ok(None);
        }

        let last_run = self.last_run().await?;
        if !is_due(now, self.send_time, last_run) {
            *ran_on = last_run;
            return Ok(None);
        }

        let today = now.date();
        tracing::info!(%today, send_time = %self.send_time.format("%H:%M"), "Scheduled run due");

        let report = self.dispatcher.send_expiry_notifications_on(today).await?;
        *ran_on = Some(today);
        self.db.set_last_run_date(EXPIRY_JOB, today).await?;

        Ok(Some(report))
    }

    /// Tick every minute until `shutdown` resolves. A failed tick is logged
    /// and retried on the next one.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let send_time = self.send_time.format("%H:%M").to_string();
        tracing::info!(%send_time, "Scheduler started");
        self.events.emit(WorkerEvent::SchedulerStarted { send_time });

        let mut interval = tokio::time::interval(TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick_once(Local::now().naive_local()).await {
                        tracing::error!("Scheduled run failed: {}", e);
                        self.events.emit(WorkerEvent::SchedulerError { error: e.to_string() });
                    }
                }
            }
        }

        tracing::info!("Scheduler stopped");
        self.events.emit(WorkerEvent::SchedulerStopped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn not_due_before_send_time() {
        assert!(!is_due(at(8, 59), nine(), None));
    }

    #[test]
    fn due_at_and_after_send_time() {
        assert!(is_due(at(9, 0), nine(), None));
        assert!(is_due(at(17, 30), nine(), None));
    }

    #[test]
    fn runs_once_per_day() {
        let today = at(9, 0).date();
        let yesterday = today.pred_opt().unwrap();

        assert!(!is_due(at(9, 1), nine(), Some(today)));
        assert!(is_due(at(9, 1), nine(), Some(yesterday)));
    }
}
