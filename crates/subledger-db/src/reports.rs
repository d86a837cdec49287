use chrono::NaiveDate;
use std::path::Path;

use crate::error::Result;
use crate::models::{
    MonthlyGrowth, NotificationView, RecordStatus, RevenueRow, ServiceRevenue, StoreCounts,
    SubscriptionView,
};
use crate::repository::{SubscriptionDb, add_days, today};

const SUBSCRIPTION_VIEW: &str = r#"
SELECT s.id, s.client_id, c.name AS client_name, c.email, c.phone, c.whatsapp,
       s.service_id, sv.name AS service_name, sv.description AS service_description,
       sv.price AS service_price, s.start_date, s.end_date, s.amount_paid,
       s.payment_method, s.transaction_id, s.status, s.auto_renewal
FROM subscriptions s
JOIN clients c ON s.client_id = c.id
JOIN services sv ON s.service_id = sv.id
"#;

impl SubscriptionDb {
    pub async fn list_active_subscriptions(&self) -> Result<Vec<SubscriptionView>> {
        self.list_active_subscriptions_on(today()).await
    }

    /// Active subscriptions that have not ended before `today`, soonest end first.
    pub async fn list_active_subscriptions_on(&self, today: NaiveDate) -> Result<Vec<SubscriptionView>> {
        let sql = format!(
            "{} WHERE s.status = ? AND s.end_date >= ? ORDER BY s.end_date, s.id",
            SUBSCRIPTION_VIEW
        );
        Ok(sqlx::query_as::<_, SubscriptionView>(&sql)
            .bind(RecordStatus::Active)
            .bind(today)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn list_expiring(&self, days_ahead: i64) -> Result<Vec<SubscriptionView>> {
        self.list_expiring_on(today(), days_ahead).await
    }

    /// Active subscriptions ending exactly on `today + days_ahead`. A
    /// subscription ending the day before or after that date is not included.
    pub async fn list_expiring_on(
        &self,
        today: NaiveDate,
        days_ahead: i64,
    ) -> Result<Vec<SubscriptionView>> {
        let target = add_days(today, days_ahead)?;
        let sql = format!(
            "{} WHERE s.status = ? AND s.end_date = ? ORDER BY c.name, s.id",
            SUBSCRIPTION_VIEW
        );
        Ok(sqlx::query_as::<_, SubscriptionView>(&sql)
            .bind(RecordStatus::Active)
            .bind(target)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Every subscription ever created, newest start first.
    pub async fn subscription_history(&self) -> Result<Vec<SubscriptionView>> {
        let sql = format!("{} ORDER BY s.start_date DESC, s.id DESC", SUBSCRIPTION_VIEW);
        Ok(sqlx::query_as::<_, SubscriptionView>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Subscriptions started between `from` and `to`, both inclusive.
    pub async fn revenue_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<RevenueRow>> {
        Ok(sqlx::query_as::<_, RevenueRow>(
            r#"SELECT s.start_date, s.end_date, s.amount_paid, s.payment_method,
                      c.name AS client_name, sv.name AS service_name
               FROM subscriptions s
               JOIN clients c ON s.client_id = c.id
               JOIN services sv ON s.service_id = sv.id
               WHERE s.start_date BETWEEN ? AND ?
               ORDER BY s.start_date DESC, s.id DESC"#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn revenue_rows(&self) -> Result<Vec<RevenueRow>> {
        Ok(sqlx::query_as::<_, RevenueRow>(
            r#"SELECT s.start_date, s.end_date, s.amount_paid, s.payment_method,
                      c.name AS client_name, sv.name AS service_name
               FROM subscriptions s
               JOIN clients c ON s.client_id = c.id
               JOIN services sv ON s.service_id = sv.id
               ORDER BY s.start_date DESC, s.id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Active subscriptions grouped by service, highest revenue first.
    pub async fn revenue_by_service_on(&self, today: NaiveDate) -> Result<Vec<ServiceRevenue>> {
        Ok(sqlx::query_as::<_, ServiceRevenue>(
            r#"SELECT sv.name AS service_name,
                      COUNT(*) AS subscriptions,
                      CAST(COALESCE(SUM(s.amount_paid), 0) AS REAL) AS revenue
               FROM subscriptions s
               JOIN services sv ON s.service_id = sv.id
               WHERE s.status = ? AND s.end_date >= ?
               GROUP BY sv.name
               ORDER BY revenue DESC, sv.name"#,
        )
        .bind(RecordStatus::Active)
        .bind(today)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn monthly_growth(&self) -> Result<Vec<MonthlyGrowth>> {
        Ok(sqlx::query_as::<_, MonthlyGrowth>(
            r#"SELECT strftime('%Y-%m', start_date) AS month,
                      COUNT(*) AS new_subscriptions,
                      CAST(COALESCE(SUM(amount_paid), 0) AS REAL) AS revenue,
                      COUNT(DISTINCT client_id) AS unique_clients
               FROM subscriptions
               GROUP BY month
               ORDER BY month"#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Latest reminder attempts first.
    pub async fn notification_history(&self, limit: i64) -> Result<Vec<NotificationView>> {
        Ok(sqlx::query_as::<_, NotificationView>(
            r#"SELECT n.id, n.client_id, c.name AS client_name, c.email AS client_email,
                      n.service_name, n.notification_type, n.scheduled_date, n.sent_date,
                      n.status, n.message
               FROM notifications n
               LEFT JOIN clients c ON n.client_id = c.id
               ORDER BY n.sent_date DESC, n.scheduled_date DESC, n.id DESC
               LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn counts(&self) -> Result<StoreCounts> {
        let (clients, services, subscriptions): (i64, i64, i64) = sqlx::query_as(
            r#"SELECT (SELECT COUNT(*) FROM clients),
                      (SELECT COUNT(*) FROM services),
                      (SELECT COUNT(*) FROM subscriptions)"#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreCounts {
            clients,
            services,
            subscriptions,
        })
    }

    /// Write a consistent copy of the database to `target`.
    pub async fn backup_to(&self, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        sqlx::query("VACUUM INTO ?")
            .bind(target.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;

        tracing::info!(target = %target.display(), "Database backup written");
        Ok(())
    }
}
