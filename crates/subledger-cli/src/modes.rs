use color_eyre::eyre::{Context, Result};
use owo_colors::OwoColorize;

use std::sync::Arc;

use subledger_notify::Notifier;
use subledger_worker::SubledgerWorker;

use crate::output::{self, heading};

fn channel_status(enabled: bool) -> String {
    if enabled {
        "enabled".green().to_string()
    } else {
        "disabled".red().to_string()
    }
}

fn notifier_status(notifier: Option<&Arc<dyn Notifier>>) -> String {
    match notifier {
        Some(n) if !n.is_configured() => "enabled, settings incomplete".yellow().to_string(),
        other => channel_status(other.is_some()),
    }
}

fn print_channels(worker: &SubledgerWorker) {
    let settings = worker.settings();
    println!("  📧 Email      {}", notifier_status(worker.notifiers().email.as_ref()));
    println!("  📱 WhatsApp   {}", notifier_status(worker.notifiers().whatsapp.as_ref()));
    println!(
        "  🔔 Reminders  {} · {} day(s) before expiry at {}",
        channel_status(settings.notifications.enabled),
        settings.notifications.days_before_expiry,
        settings.notifications.send_time
    );
}

/// Run the daily scheduler until Ctrl-C.
pub async fn scheduler(worker: &SubledgerWorker) -> Result<()> {
    heading("Reminder scheduler");
    print_channels(worker);

    let scheduler = worker.scheduler().wrap_err("Invalid notification settings")?;
    match scheduler.last_run().await? {
        Some(date) => println!("  Last run     {}", date),
        None => println!("  Last run     never"),
    }
    println!("  Press Ctrl-C to stop.");

    scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await?;
    Ok(())
}

/// Show channel status and send today's reminders once, if any are due.
pub async fn test(worker: &SubledgerWorker) -> Result<()> {
    heading("🧪 Notification test");
    print_channels(worker);

    let days = worker.settings().notifications.days_before_expiry;
    let expiring = worker.list_expiring(days).await?;
    println!("  📅 {} subscription(s) expire in {} day(s)", expiring.len(), days);

    if expiring.is_empty() {
        println!();
        println!("  No reminders to send. Add a subscription ending in {} day(s) to try it.", days);
        return Ok(());
    }

    println!();
    let report = worker.send_expiry_notifications().await?;
    output::report(&report);
    Ok(())
}
