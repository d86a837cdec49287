pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    whatsapp TEXT,
    registration_date TEXT NOT NULL DEFAULT (date('now')),
    status TEXT NOT NULL DEFAULT 'Active',
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_clients_status ON clients(status);

CREATE TABLE IF NOT EXISTS services (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    price REAL NOT NULL DEFAULT 0,
    duration_days INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'Active'
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NOT NULL,
    service_id INTEGER NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    amount_paid REAL NOT NULL,
    payment_method TEXT NOT NULL,
    transaction_id TEXT,
    status TEXT NOT NULL DEFAULT 'Active',
    auto_renewal INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE,
    FOREIGN KEY (service_id) REFERENCES services(id)
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_client ON subscriptions(client_id);
CREATE INDEX IF NOT EXISTS idx_subscriptions_end ON subscriptions(status, end_date);

CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER,
    service_name TEXT NOT NULL,
    notification_type TEXT NOT NULL,
    scheduled_date TEXT NOT NULL,
    sent_date TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    message TEXT,
    FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_client ON notifications(client_id);
CREATE INDEX IF NOT EXISTS idx_notifications_sent ON notifications(sent_date);

CREATE TABLE IF NOT EXISTS scheduler_state (
    job TEXT PRIMARY KEY NOT NULL,
    last_run_date TEXT NOT NULL
);
"#;

/// Services inserted when the services table is empty:
/// (name, description, price, duration_days).
pub const DEFAULT_SERVICES: [(&str, &str, f64, i64); 5] = [
    (
        "EQUITY Premium",
        "Equity research with daily trading signals and gamma exposure levels",
        5000.0,
        30,
    ),
    (
        "OPTION Premium",
        "Options strategies with live gamma and delta exposure analysis",
        7000.0,
        30,
    ),
    (
        "VALUATION Premium",
        "Company valuation and fundamental research reports",
        4000.0,
        30,
    ),
    (
        "COMBO - Equity + Options",
        "Equity and options premium bundle with full access",
        10000.0,
        30,
    ),
    (
        "ANNUAL - All Services",
        "Twelve months of access to every premium service",
        100000.0,
        365,
    ),
];
