use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DbError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "Active",
            RecordStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery channel of a reminder. Stored in `notifications.notification_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    WhatsApp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::WhatsApp => "whatsapp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Pending,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const PAYMENT_METHODS: [&str; 6] = [
    "UPI",
    "Bank Transfer",
    "Credit Card",
    "Debit Card",
    "Cash",
    "Net Banking",
];

/// Maximum number of characters of a message kept in the notification log.
pub const LOGGED_MESSAGE_LIMIT: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub registration_date: NaiveDate,
    pub status: RecordStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub notes: Option<String>,
}

impl NewClient {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_client(&self.name, &self.email)
    }
}

fn validate_client(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DbError::Invalid("client name is required".into()));
    }
    if !email.contains('@') {
        return Err(DbError::Invalid(format!("`{}` is not an email address", email)));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ClientUpdate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub status: RecordStatus,
    pub notes: Option<String>,
}

impl ClientUpdate {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_client(&self.name, &self.email)
    }
}

impl From<Client> for ClientUpdate {
    fn from(client: Client) -> Self {
        Self {
            name: client.name,
            email: client.email,
            phone: client.phone,
            whatsapp: client.whatsapp,
            status: client.status,
            notes: client.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_days: i64,
    pub status: RecordStatus,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_days: i64,
    pub status: RecordStatus,
}

impl NewService {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::Invalid("service name is required".into()));
        }
        if self.price < 0.0 {
            return Err(DbError::Invalid("price cannot be negative".into()));
        }
        if self.duration_days <= 0 {
            return Err(DbError::Invalid("duration must be at least one day".into()));
        }
        Ok(())
    }
}

impl From<Service> for NewService {
    fn from(service: Service) -> Self {
        Self {
            name: service.name,
            description: service.description,
            price: service.price,
            duration_days: service.duration_days,
            status: service.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub client_id: i64,
    pub service_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_paid: f64,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub status: RecordStatus,
    pub auto_renewal: bool,
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub client_id: i64,
    pub service_id: i64,
    pub start_date: NaiveDate,
    pub amount_paid: f64,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub auto_renewal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecord {
    pub id: i64,
    pub client_id: Option<i64>,
    pub service_name: String,
    #[sqlx(rename = "notification_type")]
    pub channel: Channel,
    pub scheduled_date: NaiveDate,
    pub sent_date: Option<NaiveDate>,
    pub status: DeliveryStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub client_id: i64,
    pub service_name: &'a str,
    pub channel: Channel,
    pub status: DeliveryStatus,
    pub message: &'a str,
}

/// A subscription joined with its client and service, as the dashboard,
/// reminders and exports show it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionView {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub service_id: i64,
    pub service_name: String,
    pub service_description: Option<String>,
    pub service_price: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_paid: f64,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub status: RecordStatus,
    pub auto_renewal: bool,
}

impl SubscriptionView {
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days()
    }

    /// Contact value for a channel, if the client has a non-blank one.
    pub fn contact(&self, channel: Channel) -> Option<&str> {
        let value = match channel {
            Channel::Email => Some(self.email.as_str()),
            Channel::WhatsApp => self.whatsapp.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationView {
    pub id: i64,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub service_name: String,
    #[sqlx(rename = "notification_type")]
    pub channel: Channel,
    pub scheduled_date: NaiveDate,
    pub sent_date: Option<NaiveDate>,
    pub status: DeliveryStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RevenueRow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_paid: f64,
    pub payment_method: String,
    pub client_name: String,
    pub service_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceRevenue {
    pub service_name: String,
    pub subscriptions: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthlyGrowth {
    /// `YYYY-MM`
    pub month: String,
    pub new_subscriptions: i64,
    pub revenue: f64,
    pub unique_clients: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub clients: i64,
    pub services: i64,
    pub subscriptions: i64,
}

pub(crate) fn truncate_message(message: &str) -> String {
    message.chars().take(LOGGED_MESSAGE_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "₹".repeat(LOGGED_MESSAGE_LIMIT + 20);
        let kept = truncate_message(&long);
        assert_eq!(kept.chars().count(), LOGGED_MESSAGE_LIMIT);
        assert_eq!(truncate_message("short"), "short");
    }

    #[test]
    fn service_validation_rejects_zero_duration() {
        let service = NewService {
            name: "Weekly".into(),
            description: None,
            price: 100.0,
            duration_days: 0,
            status: RecordStatus::Active,
        };
        assert!(matches!(service.validate(), Err(DbError::Invalid(_))));
    }

    #[test]
    fn blank_contacts_are_ignored() {
        let view = SubscriptionView {
            id: 1,
            client_id: 1,
            client_name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: None,
            whatsapp: Some("   ".into()),
            service_id: 1,
            service_name: "EQUITY Premium".into(),
            service_description: None,
            service_price: 5000.0,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            amount_paid: 5000.0,
            payment_method: "UPI".into(),
            transaction_id: None,
            status: RecordStatus::Active,
            auto_renewal: false,
        };
        assert_eq!(view.contact(Channel::Email), Some("asha@example.com"));
        assert_eq!(view.contact(Channel::WhatsApp), None);
        assert_eq!(view.days_remaining(NaiveDate::from_ymd_opt(2026, 1, 30).unwrap()), 1);
    }
}
