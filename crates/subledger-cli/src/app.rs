use chrono::{Datelike, Local, NaiveDate};
use color_eyre::eyre::{Report, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use subledger_core::ConfigStore;
use subledger_worker::{
    ClientUpdate, DbError, DeliveryStatus, ExportKind, NewClient, NewService, NewSubscription,
    PAYMENT_METHODS, RecordStatus, SubledgerWorker, SubscriptionView, WorkerError,
};

use crate::output::{self, amount, heading};
use crate::prompt;

pub async fn run(worker: &SubledgerWorker, config: &mut ConfigStore) -> Result<()> {
    dashboard(worker).await.unwrap_or_else(|e| output::fail(describe(&e)));

    loop {
        print_menu(&worker.settings().business.name);
        let choice = prompt::read_line("Choice: ")?;

        let result = match choice.as_str() {
            "1" => dashboard(worker).await,
            "2" => add_client(worker).await,
            "3" => list_clients(worker).await,
            "4" => edit_client(worker).await,
            "5" => delete_client(worker).await,
            "6" => services(worker).await,
            "7" => new_subscription(worker).await,
            "8" => active_subscriptions(worker).await,
            "9" => subscription_history(worker).await,
            "10" => send_reminders(worker).await,
            "11" => notification_history(worker).await,
            "12" => revenue_report(worker).await,
            "13" => export(worker).await,
            "14" => maintenance(worker, config).await,
            "0" => break,
            _ => {
                output::fail("Invalid choice");
                Ok(())
            }
        };

        if let Err(e) = result {
            output::fail(describe(&e));
        }
    }

    Ok(())
}

fn print_menu(business: &str) {
    println!();
    println!("{}", format!("═══ {} · Subscription Register ═══", business).bold());
    println!("  1. Dashboard                 8. Active subscriptions");
    println!("  2. Add client                9. Subscription history");
    println!("  3. List clients             10. Send reminders now");
    println!("  4. Edit client              11. Notification history");
    println!("  5. Delete client            12. Revenue report");
    println!("  6. Services                 13. Export CSV");
    println!("  7. New subscription         14. Maintenance");
    println!("  0. Exit");
}

/// User-facing text for a failed action.
fn describe(err: &Report) -> String {
    match err.downcast_ref::<WorkerError>() {
        Some(WorkerError::Db(DbError::Conflict(what))) => format!("A {} already exists", what),
        Some(WorkerError::Db(DbError::NotFound(what))) => format!("No {} found", what),
        Some(WorkerError::Db(DbError::Invalid(why))) => format!("Invalid input: {}", why),
        _ => format!("{:#}", err),
    }
}

fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        format!("{:<width$}", value, width = width)
    } else {
        let cut: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

async fn dashboard(worker: &SubledgerWorker) -> Result<()> {
    let today = Local::now().date_naive();
    let summary = worker.dashboard_on(today).await?;

    heading(&format!("Dashboard · {}", today));
    println!("  Total clients          {}", summary.total_clients.bold());
    println!("  Active subscriptions   {}", summary.active_subscriptions.bold());
    println!("  Active revenue         {}", amount(summary.active_revenue).bold());
    println!(
        "  Expiring tomorrow      {}",
        if summary.expiring_tomorrow.is_empty() {
            "0".green().to_string()
        } else {
            summary.expiring_tomorrow.len().red().to_string()
        }
    );

    if !summary.expiring_tomorrow.is_empty() {
        println!();
        println!("{}", "  Urgent: expiring tomorrow".red().bold());
        for s in &summary.expiring_tomorrow {
            println!(
                "   • {} · {} · {}",
                s.client_name,
                s.service_name,
                s.whatsapp.as_deref().unwrap_or(&s.email)
            );
        }
    }

    if !summary.revenue_by_service.is_empty() {
        println!();
        println!("  {}", "Revenue by service".bold());
        for row in &summary.revenue_by_service {
            println!(
                "   {} {:>4} × {:>14}",
                fit(&row.service_name, 28),
                row.subscriptions,
                amount(row.revenue)
            );
        }
    }
    Ok(())
}

// ---- clients ----

async fn add_client(worker: &SubledgerWorker) -> Result<()> {
    heading("Add client");
    let client = NewClient {
        name: prompt::required("Name")?,
        email: prompt::required("Email")?,
        phone: prompt::optional("Phone")?,
        whatsapp: prompt::optional("WhatsApp number")?,
        notes: prompt::optional("Notes")?,
    };

    let client = worker.create_client(&client).await?;
    output::ok(format!("Added {} (#{})", client.name, client.id));
    Ok(())
}

async fn list_clients(worker: &SubledgerWorker) -> Result<()> {
    let clients = worker.list_clients().await?;
    heading(&format!("Clients ({})", clients.len()));

    if clients.is_empty() {
        println!("  📭 No clients yet");
        return Ok(());
    }

    println!(
        "  {}",
        format!("{:>4}  {}  {}  {}  {}", "#", fit("Name", 22), fit("Email", 28), fit("WhatsApp", 16), "Status").dimmed()
    );
    for c in clients {
        let status = match c.status {
            RecordStatus::Active => c.status.green().to_string(),
            RecordStatus::Inactive => c.status.dimmed().to_string(),
        };
        println!(
            "  {:>4}  {}  {}  {}  {}",
            c.id,
            fit(&c.name, 22),
            fit(&c.email, 28),
            fit(c.whatsapp.as_deref().unwrap_or("-"), 16),
            status
        );
    }
    Ok(())
}

async fn edit_client(worker: &SubledgerWorker) -> Result<()> {
    let id: i64 = prompt::parsed("Client #", None)?;
    let client = worker.get_client(id).await?;
    heading(&format!("Edit {}", client.name));

    let mut update = ClientUpdate::from(client);
    update.name = prompt::with_default("Name", &update.name)?;
    update.email = prompt::with_default("Email", &update.email)?;
    update.phone = keep_or_clear("Phone", update.phone.take())?;
    update.whatsapp = keep_or_clear("WhatsApp number", update.whatsapp.take())?;
    update.notes = keep_or_clear("Notes", update.notes.take())?;
    update.status = if prompt::confirm("Active", update.status == RecordStatus::Active)? {
        RecordStatus::Active
    } else {
        RecordStatus::Inactive
    };

    let client = worker.update_client(id, &update).await?;
    output::ok(format!("Updated {}", client.name));
    Ok(())
}

/// Empty keeps the current value, `-` clears it.
fn keep_or_clear(label: &str, current: Option<String>) -> Result<Option<String>> {
    let shown = current.unwrap_or_default();
    let answer = prompt::with_default(&format!("{} ('-' to clear)", label), &shown)?;
    Ok(match answer.as_str() {
        "-" | "" => None,
        _ => Some(answer),
    })
}

async fn delete_client(worker: &SubledgerWorker) -> Result<()> {
    let id: i64 = prompt::parsed("Client #", None)?;
    let client = worker.get_client(id).await?;

    let question = format!(
        "Delete {} <{}> and all of their subscriptions?",
        client.name, client.email
    );
    if !prompt::confirm(&question, false)? {
        output::warn("Cancelled");
        return Ok(());
    }

    worker.delete_client(id).await?;
    output::ok(format!("Deleted {}", client.name));
    Ok(())
}

// ---- services ----

async fn services(worker: &SubledgerWorker) -> Result<()> {
    let services = worker.list_services().await?;
    heading(&format!("Services ({})", services.len()));
    for s in &services {
        let status = match s.status {
            RecordStatus::Active => s.status.green().to_string(),
            RecordStatus::Inactive => s.status.dimmed().to_string(),
        };
        println!(
            "  {:>3}  {}  {:>12}  {:>4} days  {}",
            s.id,
            fit(&s.name, 28),
            amount(s.price),
            s.duration_days,
            status
        );
    }

    println!();
    let action = prompt::choose("Action", &["Add service", "Edit service", "Deactivate service"])?;
    match action {
        Some(0) => {
            let service = NewService {
                name: prompt::required("Name")?,
                description: prompt::optional("Description")?,
                price: prompt::parsed("Price", Some(0.0))?,
                duration_days: prompt::parsed("Duration (days)", Some(30))?,
                status: RecordStatus::Active,
            };
            let service = worker.create_service(&service).await?;
            output::ok(format!("Added {} (#{})", service.name, service.id));
        }
        Some(1) => {
            let id: i64 = prompt::parsed("Service #", None)?;
            let mut service = NewService::from(worker.get_service(id).await?);
            service.name = prompt::with_default("Name", &service.name)?;
            service.description = keep_or_clear("Description", service.description.take())?;
            service.price = prompt::parsed("Price", Some(service.price))?;
            service.duration_days = prompt::parsed("Duration (days)", Some(service.duration_days))?;
            service.status = if prompt::confirm("Active", service.status == RecordStatus::Active)? {
                RecordStatus::Active
            } else {
                RecordStatus::Inactive
            };
            let service = worker.update_service(id, &service).await?;
            output::ok(format!("Updated {}", service.name));
            println!("  Existing subscriptions keep their end dates.");
        }
        Some(_) => {
            let id: i64 = prompt::parsed("Service #", None)?;
            worker.deactivate_service(id).await?;
            output::ok("Service deactivated");
        }
        None => {}
    }
    Ok(())
}

// ---- subscriptions ----

async fn new_subscription(worker: &SubledgerWorker) -> Result<()> {
    heading("New subscription");

    let clients: Vec<_> = worker
        .list_clients()
        .await?
        .into_iter()
        .filter(|c| c.status == RecordStatus::Active)
        .collect();
    if clients.is_empty() {
        output::warn("Add a client first");
        return Ok(());
    }
    let labels: Vec<String> = clients.iter().map(|c| format!("{} <{}>", c.name, c.email)).collect();
    let Some(client) = prompt::choose("Client", &labels)? else {
        return Ok(());
    };

    let services = worker.list_active_services().await?;
    let labels: Vec<String> = services
        .iter()
        .map(|s| format!("{} · {} · {} days", s.name, amount(s.price), s.duration_days))
        .collect();
    let Some(service) = prompt::choose("Service", &labels)? else {
        return Ok(());
    };
    let service = &services[service];

    let start_date = prompt::date("Start date", Local::now().date_naive())?;
    let amount_paid: f64 = prompt::parsed("Amount paid", Some(service.price))?;
    let Some(method) = prompt::choose("Payment method", &PAYMENT_METHODS)? else {
        return Ok(());
    };

    let subscription = NewSubscription {
        client_id: clients[client].id,
        service_id: service.id,
        start_date,
        amount_paid,
        payment_method: PAYMENT_METHODS[method].to_string(),
        transaction_id: prompt::optional("Transaction ID")?,
        auto_renewal: prompt::confirm("Auto renewal", false)?,
    };

    let created = worker.create_subscription(&subscription).await?;
    output::ok(format!(
        "{} subscribed to {} until {}",
        clients[client].name, service.name, created.end_date
    ));
    Ok(())
}

fn print_subscriptions(rows: &[SubscriptionView], today: NaiveDate) {
    for s in rows {
        let days = s.days_remaining(today);
        let remaining = match days {
            d if d < 0 => "ended".dimmed().to_string(),
            d if d <= 1 => format!("{} d", d).red().to_string(),
            d if d <= 7 => format!("{} d", d).yellow().to_string(),
            d => format!("{} d", d).green().to_string(),
        };
        println!(
            "  {:>4}  {}  {}  {} → {}  {:>12}  {}",
            s.id,
            fit(&s.client_name, 20),
            fit(&s.service_name, 24),
            s.start_date,
            s.end_date,
            amount(s.amount_paid),
            remaining
        );
    }
}

async fn active_subscriptions(worker: &SubledgerWorker) -> Result<()> {
    let today = Local::now().date_naive();
    let rows = worker.list_active_subscriptions().await?;
    heading(&format!("Active subscriptions ({})", rows.len()));

    if rows.is_empty() {
        println!("  📭 No active subscriptions");
        return Ok(());
    }
    print_subscriptions(&rows, today);

    let within_week = rows.iter().filter(|s| s.days_remaining(today) <= 7).count();
    println!();
    println!(
        "  {} ending within 7 days, {} in total",
        within_week.yellow(),
        amount(rows.iter().map(|s| s.amount_paid).sum())
    );
    Ok(())
}

async fn subscription_history(worker: &SubledgerWorker) -> Result<()> {
    let today = Local::now().date_naive();
    let rows = worker.subscription_history().await?;
    heading(&format!("Subscription history ({})", rows.len()));

    print_subscriptions(&rows, today);

    let active = rows.iter().filter(|s| s.days_remaining(today) >= 0).count();
    println!();
    println!(
        "  {} subscriptions, {} still running, {} collected",
        rows.len(),
        active,
        amount(rows.iter().map(|s| s.amount_paid).sum()).bold()
    );
    Ok(())
}

// ---- reminders ----

async fn send_reminders(worker: &SubledgerWorker) -> Result<()> {
    heading("Send reminders now");
    let days = worker.settings().notifications.days_before_expiry;
    let expiring = worker.list_expiring(days).await?;

    if expiring.is_empty() {
        output::ok(format!("No subscriptions expire in {} day(s)", days));
        return Ok(());
    }
    for s in &expiring {
        println!("   • {} · {} · ends {}", s.client_name, s.service_name, s.end_date);
    }
    if worker.notifiers().is_empty() {
        output::warn("No channel is enabled; run `--mode setup` first");
        return Ok(());
    }
    if !prompt::confirm(&format!("Send {} reminder(s)?", expiring.len()), true)? {
        return Ok(());
    }

    let report = worker.send_expiry_notifications().await?;
    output::report(&report);
    Ok(())
}

async fn notification_history(worker: &SubledgerWorker) -> Result<()> {
    let rows = worker.notification_history(50).await?;
    heading(&format!("Notification history (latest {})", rows.len()));

    if rows.is_empty() {
        println!("  📭 No reminders sent yet");
        return Ok(());
    }

    for n in &rows {
        let status = match n.status {
            DeliveryStatus::Sent => n.status.green().to_string(),
            DeliveryStatus::Failed => n.status.red().to_string(),
            DeliveryStatus::Pending => n.status.yellow().to_string(),
        };
        println!(
            "  {}  {}  {}  {:<8}  {}",
            n.sent_date.unwrap_or(n.scheduled_date),
            fit(n.client_name.as_deref().unwrap_or("(deleted client)"), 20),
            fit(&n.service_name, 24),
            n.channel.as_str(),
            status
        );
    }

    let sent = rows.iter().filter(|n| n.status == DeliveryStatus::Sent).count();
    println!();
    println!(
        "  Success rate {:.1}% ({} of {})",
        sent as f64 * 100.0 / rows.len() as f64,
        sent,
        rows.len()
    );
    Ok(())
}

// ---- reports ----

async fn revenue_report(worker: &SubledgerWorker) -> Result<()> {
    let today = Local::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);

    let from = prompt::date("From", month_start)?;
    let to = prompt::date("To", today)?;
    let rows = worker.revenue_between(from, to).await?;

    heading(&format!("Revenue {} – {}", from, to));
    for r in &rows {
        println!(
            "  {}  {}  {}  {:>12}  {}",
            r.start_date,
            fit(&r.client_name, 20),
            fit(&r.service_name, 24),
            amount(r.amount_paid),
            r.payment_method
        );
    }
    let total: f64 = rows.iter().map(|r| r.amount_paid).sum();
    println!();
    println!("  {} subscription(s), {} total", rows.len(), amount(total).bold());
    if !rows.is_empty() {
        println!("  Average {}", amount(total / rows.len() as f64));
    }

    let growth = worker.monthly_growth().await?;
    if !growth.is_empty() {
        heading("Monthly growth");
        for m in growth {
            println!(
                "  {}  {:>4} new  {:>4} clients  {:>14}",
                m.month,
                m.new_subscriptions,
                m.unique_clients,
                amount(m.revenue)
            );
        }
    }
    Ok(())
}

async fn export(worker: &SubledgerWorker) -> Result<()> {
    heading("Export CSV");
    let mut options: Vec<String> = ExportKind::ALL.iter().map(|k| k.to_string()).collect();
    options.push("all".to_string());

    let Some(choice) = prompt::choose("Export", &options)? else {
        return Ok(());
    };
    let kinds: Vec<ExportKind> = match ExportKind::ALL.get(choice) {
        Some(kind) => vec![*kind],
        None => ExportKind::ALL.to_vec(),
    };

    let dir = PathBuf::from(prompt::with_default("Directory", ".")?);
    let today = Local::now().date_naive();
    for kind in kinds {
        let path = worker.export(kind, &dir, today).await?;
        output::ok(format!("Wrote {}", path.display()));
    }
    Ok(())
}

// ---- maintenance ----

async fn maintenance(worker: &SubledgerWorker, config: &mut ConfigStore) -> Result<()> {
    heading("Maintenance");
    let action = prompt::choose(
        "Action",
        &[
            "Database health",
            "Back up database",
            "Remove inactive clients",
            "Reset configuration to defaults",
        ],
    )?;

    match action {
        Some(0) => {
            let counts = worker.counts().await?;
            output::ok("Database reachable");
            println!("  Clients        {}", counts.clients);
            println!("  Services       {}", counts.services);
            println!("  Subscriptions  {}", counts.subscriptions);
            println!("  Config file    {}", config.path().display());
        }
        Some(1) => {
            let default = format!("subscriptions_backup_{}.db", Local::now().format("%Y%m%d_%H%M%S"));
            let target = PathBuf::from(prompt::with_default("Backup file", &default)?);
            worker.backup_to(&target).await?;
            output::ok(format!("Backup written to {}", target.display()));
        }
        Some(2) => {
            if prompt::confirm("Delete every inactive client and their subscriptions?", false)? {
                let removed = worker.remove_inactive_clients().await?;
                output::ok(format!("Removed {} inactive client(s)", removed));
            }
        }
        Some(_) => {
            if prompt::confirm("Replace the whole configuration with defaults?", false)? {
                config.reset();
                config.save()?;
                output::ok("Configuration reset; restart to apply it");
            }
        }
        None => {}
    }
    Ok(())
}
