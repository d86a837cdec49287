use chrono::{Local, NaiveDate};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

use crate::error::{DbError, Result};
use crate::models::{
    Client, ClientUpdate, NewClient, NewNotification, NewService, NewSubscription,
    NotificationRecord, RecordStatus, Service, Subscription, truncate_message,
};
use crate::schema::{DEFAULT_SERVICES, SCHEMA};

/// Local calendar date used for every "today" in the register.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct SubscriptionDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl SubscriptionDb {
    /// Open (or create) the database file, apply the schema and seed the
    /// default services if the services table is empty.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        let db = Self { pool };
        db.seed_services().await?;

        tracing::info!("Database initialized at: {}", path.display());

        Ok(db)
    }

    async fn seed_services(&self) -> Result<()> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        for (name, description, price, duration_days) in DEFAULT_SERVICES {
            sqlx::query(
                "INSERT INTO services (name, description, price, duration_days) VALUES (?, ?, ?, ?)",
            )
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(duration_days)
            .execute(&self.pool)
            .await?;
        }

        tracing::info!(count = DEFAULT_SERVICES.len(), "Seeded default services");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ---- clients ----

    pub async fn create_client(&self, client: &NewClient, registered_on: NaiveDate) -> Result<Client> {
        client.validate()?;

        let id = sqlx::query(
            "INSERT INTO clients (name, email, phone, whatsapp, registration_date, notes)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(client.name.trim())
        .bind(client.email.trim())
        .bind(blank_to_none(client.phone.as_deref()))
        .bind(blank_to_none(client.whatsapp.as_deref()))
        .bind(registered_on)
        .bind(blank_to_none(client.notes.as_deref()))
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, || format!("client with email {}", client.email.trim())))?
        .last_insert_rowid();

        tracing::info!(client_id = id, "Client created");
        self.get_client(id).await
    }

    pub async fn get_client(&self, id: i64) -> Result<Client> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("client {}", id)))
    }

    pub async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>> {
        Ok(sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        Ok(sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update_client(&self, id: i64, update: &ClientUpdate) -> Result<Client> {
        update.validate()?;

        let result = sqlx::query(
            "UPDATE clients SET name = ?, email = ?, phone = ?, whatsapp = ?, status = ?, notes = ?
             WHERE id = ?",
        )
        .bind(update.name.trim())
        .bind(update.email.trim())
        .bind(blank_to_none(update.phone.as_deref()))
        .bind(blank_to_none(update.whatsapp.as_deref()))
        .bind(update.status)
        .bind(blank_to_none(update.notes.as_deref()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, || format!("client with email {}", update.email.trim())))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("client {}", id)));
        }

        self.get_client(id).await
    }

    /// Hard delete. Subscriptions of the client go with it; its notification
    /// rows stay with a NULL client.
    pub async fn delete_client(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("client {}", id)));
        }

        tracing::info!(client_id = id, "Client deleted");
        Ok(())
    }

    pub async fn remove_inactive_clients(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM clients WHERE status = ?")
            .bind(RecordStatus::Inactive)
            .execute(&self.pool)
            .await?;

        tracing::info!(count = result.rows_affected(), "Removed inactive clients");
        Ok(result.rows_affected())
    }

    // ---- services ----

    pub async fn create_service(&self, service: &NewService) -> Result<Service> {
        service.validate()?;

        let id = sqlx::query(
            "INSERT INTO services (name, description, price, duration_days, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(service.name.trim())
        .bind(blank_to_none(service.description.as_deref()))
        .bind(service.price)
        .bind(service.duration_days)
        .bind(service.status)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, || format!("service named {}", service.name.trim())))?
        .last_insert_rowid();

        self.get_service(id).await
    }

    pub async fn get_service(&self, id: i64) -> Result<Service> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("service {}", id)))
    }

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn list_active_services(&self) -> Result<Vec<Service>> {
        Ok(
            sqlx::query_as::<_, Service>("SELECT * FROM services WHERE status = ? ORDER BY name")
                .bind(RecordStatus::Active)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Existing subscriptions keep the end date computed when they were
    /// created, whatever happens to the service's duration here.
    pub async fn update_service(&self, id: i64, service: &NewService) -> Result<Service> {
        service.validate()?;

        let result = sqlx::query(
            "UPDATE services SET name = ?, description = ?, price = ?, duration_days = ?, status = ?
             WHERE id = ?",
        )
        .bind(service.name.trim())
        .bind(blank_to_none(service.description.as_deref()))
        .bind(service.price)
        .bind(service.duration_days)
        .bind(service.status)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, || format!("service named {}", service.name.trim())))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("service {}", id)));
        }

        self.get_service(id).await
    }

    /// Soft delete.
    pub async fn deactivate_service(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE services SET status = ? WHERE id = ?")
            .bind(RecordStatus::Inactive)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("service {}", id)));
        }

        tracing::info!(service_id = id, "Service deactivated");
        Ok(())
    }

    // ---- subscriptions ----

    pub async fn create_subscription(&self, new: &NewSubscription) -> Result<Subscription> {
        if new.amount_paid < 0.0 {
            return Err(DbError::Invalid("amount paid cannot be negative".into()));
        }
        if new.payment_method.trim().is_empty() {
            return Err(DbError::Invalid("payment method is required".into()));
        }

        let client = self.get_client(new.client_id).await?;
        let service = self.get_service(new.service_id).await?;
        let end_date = add_days(new.start_date, service.duration_days)?;

        let id = sqlx::query(
            "INSERT INTO subscriptions
             (client_id, service_id, start_date, end_date, amount_paid, payment_method, transaction_id, auto_renewal)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(client.id)
        .bind(service.id)
        .bind(new.start_date)
        .bind(end_date)
        .bind(new.amount_paid)
        .bind(new.payment_method.trim())
        .bind(blank_to_none(new.transaction_id.as_deref()))
        .bind(new.auto_renewal)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!(
            subscription_id = id,
            client = %client.name,
            service = %service.name,
            %end_date,
            "Subscription created"
        );

        self.get_subscription(id).await
    }

    pub async fn get_subscription(&self, id: i64) -> Result<Subscription> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("subscription {}", id)))
    }

    // ---- notification log ----

    pub async fn log_notification(
        &self,
        entry: &NewNotification<'_>,
        on: NaiveDate,
    ) -> Result<NotificationRecord> {
        let id = sqlx::query(
            "INSERT INTO notifications
             (client_id, service_name, notification_type, scheduled_date, sent_date, status, message)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.client_id)
        .bind(entry.service_name)
        .bind(entry.channel)
        .bind(on)
        .bind(on)
        .bind(entry.status)
        .bind(truncate_message(entry.message))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(
            sqlx::query_as::<_, NotificationRecord>("SELECT * FROM notifications WHERE id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    // ---- scheduler state ----

    pub async fn last_run_date(&self, job: &str) -> Result<Option<NaiveDate>> {
        let row: Option<(NaiveDate,)> =
            sqlx::query_as("SELECT last_run_date FROM scheduler_state WHERE job = ?")
                .bind(job)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(date,)| date))
    }

    pub async fn set_last_run_date(&self, job: &str, date: NaiveDate) -> Result<()> {
        sqlx::query(
            "INSERT INTO scheduler_state (job, last_run_date) VALUES (?, ?)
             ON CONFLICT(job) DO UPDATE SET last_run_date = excluded.last_run_date",
        )
        .bind(job)
        .bind(date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub(crate) fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    chrono::TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| DbError::Invalid(format!("{} + {} days is out of range", date, days)))
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
