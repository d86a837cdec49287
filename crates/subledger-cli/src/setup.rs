use color_eyre::eyre::Result;
use owo_colors::OwoColorize;

use subledger_core::{ConfigStore, parse_send_time};
use subledger_notify::{EmailNotifier, WhatsAppNotifier};

use crate::output::{self, heading};
use crate::prompt;

/// SMTP presets offered by the wizard: (label, server, port).
const EMAIL_PROVIDERS: [(&str, &str, u16); 3] = [
    ("Gmail", "smtp.gmail.com", 587),
    ("Outlook / Hotmail", "smtp.office365.com", 587),
    ("Yahoo", "smtp.mail.yahoo.com", 587),
];

pub async fn run(config: &mut ConfigStore) -> Result<()> {
    heading("Setup");
    println!("Configuration file: {}", config.path().display().dimmed());

    let choice = prompt::choose(
        "Configure",
        &[
            "Email settings",
            "WhatsApp settings",
            "Business information",
            "Notification settings",
            "Everything",
        ],
    )?;

    match choice {
        Some(0) => email(config).await?,
        Some(1) => whatsapp(config).await?,
        Some(2) => business(config)?,
        Some(3) => notifications(config)?,
        Some(_) => {
            business(config)?;
            email(config).await?;
            whatsapp(config).await?;
            notifications(config)?;
        }
        None => {
            output::warn("Setup cancelled");
            return Ok(());
        }
    }

    config.save()?;
    output::ok(format!("Saved {}", config.path().display()));
    println!();
    println!("Next steps:");
    println!("  subledger                    run the register");
    println!("  subledger --mode scheduler   send reminders every day");
    Ok(())
}

async fn email(config: &mut ConfigStore) -> Result<()> {
    heading("📧 Email");

    let mut labels: Vec<&str> = EMAIL_PROVIDERS.iter().map(|(label, _, _)| *label).collect();
    labels.push("Custom SMTP server");

    match prompt::choose("Provider", &labels)? {
        Some(i) if i < EMAIL_PROVIDERS.len() => {
            let (label, server, port) = EMAIL_PROVIDERS[i];
            config.set("email.smtp_server", server)?;
            config.set("email.smtp_port", port)?;
            if label == "Gmail" {
                println!("  Gmail needs an app password: enable 2-step verification, then create");
                println!("  one under Google Account → Security → App passwords.");
            }
        }
        Some(_) => {
            let current = config.get_or("email.smtp_server", String::new());
            config.set("email.smtp_server", prompt::with_default("SMTP server", &current)?)?;
            let port: u16 = prompt::parsed("SMTP port", Some(587))?;
            config.set("email.smtp_port", port)?;
        }
        None => return Ok(()),
    }

    let current = config.get_or("email.email_address", String::new());
    config.set("email.email_address", prompt::with_default("Email address", &current)?)?;
    config.set("email.email_password", prompt::required("Password / app password")?)?;

    let enabled = if prompt::confirm("Send a test email to that address?", true)? {
        let settings = config.settings()?;
        let result = match EmailNotifier::new(&settings.email) {
            Ok(notifier) => notifier.send_test().await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                output::ok("Test email sent");
                true
            }
            Err(e) => {
                output::fail(format!("Test email failed: {}", e));
                output::warn("Email settings saved but disabled");
                false
            }
        }
    } else {
        output::ok("Email settings saved (not tested)");
        true
    };

    config.set("email.enabled", enabled)?;
    Ok(())
}

async fn whatsapp(config: &mut ConfigStore) -> Result<()> {
    heading("📱 WhatsApp");
    println!("  Reminders are posted to a WhatsApp Business API gateway as");
    println!("  {{\"phone\", \"message\"}} with a bearer token.");

    if !prompt::confirm("Configure WhatsApp now?", true)? {
        config.set("whatsapp.enabled", false)?;
        output::warn("WhatsApp skipped");
        return Ok(());
    }

    let current = config.get_or("whatsapp.api_url", String::new());
    config.set("whatsapp.api_url", prompt::with_default("API URL", &current)?)?;
    config.set("whatsapp.api_key", prompt::required("API key")?)?;

    let enabled = if prompt::confirm("Send a test message?", true)? {
        let phone = prompt::required("Test phone number (with country code)")?;
        let settings = config.settings()?;
        let result = match WhatsAppNotifier::new(&settings.whatsapp) {
            Ok(notifier) => notifier.send_test(&phone).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                output::ok("Test message sent");
                true
            }
            Err(e) => {
                output::fail(format!("Test message failed: {}", e));
                output::warn("WhatsApp settings saved but disabled");
                false
            }
        }
    } else {
        output::ok("WhatsApp settings saved (not tested)");
        true
    };

    config.set("whatsapp.enabled", enabled)?;
    Ok(())
}

fn business(config: &mut ConfigStore) -> Result<()> {
    heading("🏢 Business information");

    for (key, label) in [
        ("business.name", "Business name"),
        ("business.contact_phone", "Contact phone"),
        ("business.contact_email", "Contact email"),
        ("business.website", "Website"),
        ("business.address", "Address"),
    ] {
        let current = config.get_or(key, String::new());
        config.set(key, prompt::with_default(label, &current)?)?;
    }
    Ok(())
}

fn notifications(config: &mut ConfigStore) -> Result<()> {
    heading("🔔 Reminders");

    let days: i64 = prompt::parsed(
        "Days before expiry",
        Some(config.get_or("notifications.days_before_expiry", 1_i64)),
    )?;
    config.set("notifications.days_before_expiry", days)?;

    let current = config.get_or("notifications.send_time", "09:00".to_string());
    let send_time = loop {
        let answer = prompt::with_default("Daily send time (HH:MM)", &current)?;
        match parse_send_time(&answer) {
            Ok(time) => break time.format("%H:%M").to_string(),
            Err(e) => output::warn(e.to_string()),
        }
    };
    config.set("notifications.send_time", send_time)?;

    let enabled = prompt::confirm("Send reminders automatically?", true)?;
    config.set("notifications.enabled", enabled)?;
    Ok(())
}
