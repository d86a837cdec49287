use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Typed snapshot of the configuration tree handed to every component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub email: EmailSettings,
    pub whatsapp: WhatsAppSettings,
    pub notifications: NotificationSettings,
    pub business: BusinessInfo,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub email_address: String,
    pub email_password: String,
    pub enabled: bool,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            email_address: String::new(),
            email_password: String::new(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppSettings {
    pub api_url: String,
    pub api_key: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub days_before_expiry: i64,
    /// Daily send time, `HH:MM` in local time.
    pub send_time: String,
    pub enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            days_before_expiry: 1,
            send_time: "09:00".to_string(),
            enabled: true,
        }
    }
}

impl NotificationSettings {
    pub fn send_time(&self) -> Result<NaiveTime> {
        parse_send_time(&self.send_time)
    }
}

pub fn parse_send_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| ConfigError::Invalid(format!("send_time `{}`: {}", value, e)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessInfo {
    pub name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub website: String,
    pub address: String,
}

impl Default for BusinessInfo {
    fn default() -> Self {
        Self {
            name: "Signal Desk".to_string(),
            contact_phone: "+00-0000000000".to_string(),
            contact_email: "support@example.com".to_string(),
            website: "https://example.com".to_string(),
            address: String::new(),
        }
    }
}

impl BusinessInfo {
    /// Phone number in the digits-only form `wa.me` links expect.
    pub fn whatsapp_link(&self) -> String {
        let digits: String = self
            .contact_phone
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        format!("https://wa.me/{}", digits)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("subscriptions.db"),
        }
    }
}
