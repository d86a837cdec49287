use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

use subledger_db::{Client, RevenueRow, SubscriptionView};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Clients,
    /// Active subscriptions only.
    Subscriptions,
    Revenue,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [ExportKind::Clients, ExportKind::Subscriptions, ExportKind::Revenue];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Clients => "clients",
            ExportKind::Subscriptions => "subscriptions",
            ExportKind::Revenue => "revenue",
        }
    }

    /// `<kind>_<YYYYMMDD>.csv`
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}_{}.csv", self.as_str(), date.format("%Y%m%d"))
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote a field if it contains a comma, quote or line break.
pub fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_row<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let row: Vec<String> = fields.into_iter().map(|f| csv_escape(f.as_ref())).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

pub fn clients_csv(clients: &[Client]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        ["id", "name", "email", "phone", "whatsapp", "registration_date", "status", "notes"],
    );
    for c in clients {
        push_row(
            &mut out,
            [
                c.id.to_string(),
                c.name.clone(),
                c.email.clone(),
                c.phone.clone().unwrap_or_default(),
                c.whatsapp.clone().unwrap_or_default(),
                c.registration_date.to_string(),
                c.status.to_string(),
                c.notes.clone().unwrap_or_default(),
            ],
        );
    }
    out
}

pub fn subscriptions_csv(rows: &[SubscriptionView], today: NaiveDate) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        [
            "id",
            "client",
            "email",
            "service",
            "start_date",
            "end_date",
            "days_remaining",
            "amount_paid",
            "payment_method",
            "transaction_id",
            "auto_renewal",
        ],
    );
    for s in rows {
        push_row(
            &mut out,
            [
                s.id.to_string(),
                s.client_name.clone(),
                s.email.clone(),
                s.service_name.clone(),
                s.start_date.to_string(),
                s.end_date.to_string(),
                s.days_remaining(today).to_string(),
                format!("{:.2}", s.amount_paid),
                s.payment_method.clone(),
                s.transaction_id.clone().unwrap_or_default(),
                s.auto_renewal.to_string(),
            ],
        );
    }
    out
}

pub fn revenue_csv(rows: &[RevenueRow]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        ["start_date", "end_date", "client", "service", "amount_paid", "payment_method"],
    );
    for r in rows {
        push_row(
            &mut out,
            [
                r.start_date.to_string(),
                r.end_date.to_string(),
                r.client_name.clone(),
                r.service_name.clone(),
                format!("{:.2}", r.amount_paid),
                r.payment_method.clone(),
            ],
        );
    }
    out
}

pub(crate) fn write_export(dir: &Path, kind: ExportKind, date: NaiveDate, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(kind.file_name(date));
    std::fs::write(&path, contents)?;

    tracing::info!(%kind, path = %path.display(), "Export written");
    Ok(path)
}
