use owo_colors::OwoColorize;
use subledger_worker::{DispatchReport, WorkerEvent};

pub fn ok(message: impl AsRef<str>) {
    println!("{} {}", "✔".green(), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    println!("{} {}", "!".yellow(), message.as_ref().yellow());
}

pub fn fail(message: impl AsRef<str>) {
    println!("{} {}", "✘".red(), message.as_ref().red());
}

pub fn heading(title: &str) {
    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn amount(value: f64) -> String {
    let whole = format!("{:.2}", value.abs());
    let (int, frac) = whole.split_once('.').unwrap_or((whole.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

pub fn report(report: &DispatchReport) {
    if report.disabled {
        warn("Reminders are disabled in the configuration");
        return;
    }

    println!(
        "{}: {} subscription(s) expiring in {} day(s)",
        report.date, report.expiring, report.days_before
    );
    if report.expiring == 0 {
        ok("Nothing to send today");
    } else {
        println!(
            "  {} sent, {} failed",
            report.sent.green(),
            if report.failed > 0 {
                report.failed.red().to_string()
            } else {
                report.failed.to_string()
            }
        );
        if report.unlogged > 0 {
            warn(format!("{} attempt(s) could not be written to the notification log", report.unlogged));
        }
    }
}

pub fn event(event: WorkerEvent) {
    match event {
        WorkerEvent::NotificationsDisabled { date } => {
            println!("\n{} reminders disabled, skipped run for {}", "⏸".yellow(), date);
        }
        WorkerEvent::DispatchStarted {
            date,
            days_before,
            expiring,
        } => {
            println!(
                "\n📨 {}: {} subscription(s) expire in {} day(s)",
                date, expiring, days_before
            );
        }
        WorkerEvent::NotificationSent {
            client,
            service,
            channel,
        } => {
            println!("   {} {} ({}) via {}", "✔".green(), client, service, channel);
        }
        WorkerEvent::NotificationFailed {
            client,
            service,
            channel,
            error,
        } => {
            println!(
                "   {} {} ({}) via {}: {}",
                "✘".red(),
                client,
                service,
                channel,
                error.red()
            );
        }
        WorkerEvent::DispatchCompleted { date, sent, failed } => {
            println!("✅ Run for {} done: {} sent, {} failed", date, sent, failed);
        }
        WorkerEvent::SchedulerStarted { send_time } => {
            println!("⏰ Scheduler running, reminders go out daily at {}", send_time.bold());
        }
        WorkerEvent::SchedulerStopped => {
            println!("👋 Scheduler stopped");
        }
        WorkerEvent::SchedulerError { error } => {
            println!("{} Scheduled run failed: {}", "✘".red(), error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(amount(0.0), "0.00");
        assert_eq!(amount(999.5), "999.50");
        assert_eq!(amount(100000.0), "100,000.00");
        assert_eq!(amount(1234567.891), "1,234,567.89");
        assert_eq!(amount(-7000.0), "-7,000.00");
    }
}
