mod dispatcher;
mod error;
mod events;
mod export;
mod scheduler;
mod worker;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::WorkerError;
pub use events::WorkerEvent;
pub use export::{ExportKind, csv_escape};
pub use scheduler::{EXPIRY_JOB, Scheduler, TICK, is_due};
pub use worker::{DashboardSummary, SubledgerWorker};

pub use subledger_core::Settings;
pub use subledger_db::{
    Channel, Client, ClientUpdate, DbError, DeliveryStatus, MonthlyGrowth, NewClient, NewService,
    NewSubscription, NotificationView, PAYMENT_METHODS, RecordStatus, RevenueRow, Service,
    ServiceRevenue, StoreCounts, Subscription, SubscriptionView,
};
