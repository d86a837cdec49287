use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use subledger_core::{Settings, resolve_data_path};
use subledger_db::{
    Client, ClientUpdate, MonthlyGrowth, NewClient, NewService, NewSubscription,
    NotificationView, RevenueRow, Service, ServiceRevenue, StoreCounts, Subscription,
    SubscriptionDb, SubscriptionView,
};
use subledger_notify::Notifiers;

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::Result;
use crate::events::{EventSink, WorkerEvent};
use crate::export::{self, ExportKind};
use crate::scheduler::Scheduler;

/// Figures shown at the top of the interactive app.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_clients: usize,
    pub active_subscriptions: usize,
    /// Sum of `amount_paid` over active subscriptions.
    pub active_revenue: f64,
    pub expiring_tomorrow: Vec<SubscriptionView>,
    pub revenue_by_service: Vec<ServiceRevenue>,
}

pub struct SubledgerWorker {
    db: Arc<SubscriptionDb>,
    settings: Settings,
    dispatcher: Arc<Dispatcher>,
    events: EventSink,
    event_rx: Option<mpsc::Receiver<WorkerEvent>>,
}

impl SubledgerWorker {
    /// Open the database named by the settings and build the enabled
    /// notifiers.
    pub async fn new(settings: Settings) -> Result<Self> {
        let path = resolve_data_path(&settings.database.path)?;
        let db = SubscriptionDb::open(&path).await?;
        let notifiers = Notifiers::from_settings(&settings);
        Ok(Self::with_parts(db, settings, notifiers))
    }

    pub fn with_parts(db: SubscriptionDb, settings: Settings, notifiers: Notifiers) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);
        let events = EventSink::new(event_tx);
        let db = Arc::new(db);
        let dispatcher = Dispatcher::with_notifiers(db.clone(), &settings, notifiers)
            .with_events(events.clone());

        Self {
            db,
            settings,
            dispatcher: Arc::new(dispatcher),
            events,
            event_rx: Some(event_rx),
        }
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<WorkerEvent>> {
        self.event_rx.take()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn notifiers(&self) -> &Notifiers {
        self.dispatcher.notifiers()
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    pub fn scheduler(&self) -> Result<Scheduler> {
        Ok(
            Scheduler::new(self.db.clone(), self.dispatcher.clone(), &self.settings.notifications)?
                .with_events(self.events.clone()),
        )
    }

    pub async fn send_expiry_notifications(&self) -> Result<DispatchReport> {
        self.dispatcher.send_expiry_notifications().await
    }

    pub async fn send_expiry_notifications_on(&self, today: NaiveDate) -> Result<DispatchReport> {
        self.dispatcher.send_expiry_notifications_on(today).await
    }

    pub async fn dashboard_on(&self, today: NaiveDate) -> Result<DashboardSummary> {
        let clients = self.db.list_clients().await?;
        let active = self.db.list_active_subscriptions_on(today).await?;
        let expiring_tomorrow = self.db.list_expiring_on(today, 1).await?;
        let revenue_by_service = self.db.revenue_by_service_on(today).await?;

        Ok(DashboardSummary {
            total_clients: clients.len(),
            active_subscriptions: active.len(),
            active_revenue: active.iter().map(|s| s.amount_paid).sum(),
            expiring_tomorrow,
            revenue_by_service,
        })
    }

    // ---- clients ----

    pub async fn create_client(&self, client: &NewClient) -> Result<Client> {
        Ok(self.db.create_client(client, subledger_db::today()).await?)
    }

    pub async fn get_client(&self, id: i64) -> Result<Client> {
        Ok(self.db.get_client(id).await?)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        Ok(self.db.list_clients().await?)
    }

    pub async fn update_client(&self, id: i64, update: &ClientUpdate) -> Result<Client> {
        Ok(self.db.update_client(id, update).await?)
    }

    pub async fn delete_client(&self, id: i64) -> Result<()> {
        Ok(self.db.delete_client(id).await?)
    }

    pub async fn remove_inactive_clients(&self) -> Result<u64> {
        Ok(self.db.remove_inactive_clients().await?)
    }

    // ---- services ----

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(self.db.list_services().await?)
    }

    pub async fn list_active_services(&self) -> Result<Vec<Service>> {
        Ok(self.db.list_active_services().await?)
    }

    pub async fn get_service(&self, id: i64) -> Result<Service> {
        Ok(self.db.get_service(id).await?)
    }

    pub async fn create_service(&self, service: &NewService) -> Result<Service> {
        Ok(self.db.create_service(service).await?)
    }

    pub async fn update_service(&self, id: i64, service: &NewService) -> Result<Service> {
        Ok(self.db.update_service(id, service).await?)
    }

    pub async fn deactivate_service(&self, id: i64) -> Result<()> {
        Ok(self.db.deactivate_service(id).await?)
    }

    // ---- subscriptions ----

    pub async fn create_subscription(&self, subscription: &NewSubscription) -> Result<Subscription> {
        Ok(self.db.create_subscription(subscription).await?)
    }

    pub async fn list_active_subscriptions(&self) -> Result<Vec<SubscriptionView>> {
        Ok(self.db.list_active_subscriptions().await?)
    }

    pub async fn list_expiring(&self, days_ahead: i64) -> Result<Vec<SubscriptionView>> {
        Ok(self.db.list_expiring(days_ahead).await?)
    }

    pub async fn subscription_history(&self) -> Result<Vec<SubscriptionView>> {
        Ok(self.db.subscription_history().await?)
    }

    // ---- reports ----

    pub async fn notification_history(&self, limit: i64) -> Result<Vec<NotificationView>> {
        Ok(self.db.notification_history(limit).await?)
    }

    pub async fn revenue_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<RevenueRow>> {
        Ok(self.db.revenue_between(from, to).await?)
    }

    pub async fn monthly_growth(&self) -> Result<Vec<MonthlyGrowth>> {
        Ok(self.db.monthly_growth().await?)
    }

    pub async fn counts(&self) -> Result<StoreCounts> {
        Ok(self.db.counts().await?)
    }

    pub async fn backup_to(&self, target: &Path) -> Result<()> {
        Ok(self.db.backup_to(target).await?)
    }

    /// Write a CSV export into `dir`, returning the file's path.
    pub async fn export(&self, kind: ExportKind, dir: &Path, today: NaiveDate) -> Result<PathBuf> {
        let contents = match kind {
            ExportKind::Clients => export::clients_csv(&self.db.list_clients().await?),
            ExportKind::Subscriptions => {
                export::subscriptions_csv(&self.db.list_active_subscriptions_on(today).await?, today)
            }
            ExportKind::Revenue => export::revenue_csv(&self.db.revenue_rows().await?),
        };

        export::write_export(dir, kind, today, &contents)
    }
}
