use subledger_core::BusinessInfo;
use subledger_db::SubscriptionView;

/// A reminder ready to hand to a [`crate::Notifier`]. WhatsApp messages have
/// no subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: Option<String>,
    pub body: String,
}

pub fn email_subject(business: &BusinessInfo, service_name: &str) -> String {
    format!("{} - {} Subscription Expiring Soon", business.name, service_name)
}

pub fn render_email(view: &SubscriptionView, business: &BusinessInfo) -> RenderedMessage {
    let name = escape_html(&business.name);
    let description = view
        .service_description
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();

    let mut body = String::new();
    body.push_str("<html>\n<body style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333;\">\n");
    body.push_str("<div style=\"max-width: 600px; margin: 0 auto; padding: 20px;\">\n");
    body.push_str(&format!(
        "<div style=\"background: #667eea; color: white; padding: 20px; border-radius: 10px; text-align: center;\">\
         <h1 style=\"margin: 0; font-size: 24px;\">{}</h1>\
         <p style=\"margin: 10px 0 0 0;\">Premium Trading &amp; Analysis Services</p></div>\n",
        name
    ));
    body.push_str("<h2 style=\"color: #667eea;\">Subscription Expiry Reminder</h2>\n");
    body.push_str(&format!(
        "<p>Dear <strong>{}</strong>,</p>\n",
        escape_html(&view.client_name)
    ));
    body.push_str(
        "<p>This is a friendly reminder that your subscription is about to expire:</p>\n",
    );
    body.push_str(&format!(
        "<div style=\"background-color: #f8f9fa; padding: 20px; border-left: 4px solid #ffc107;\">\
         <p><strong>Service:</strong> {}</p>\
         <p><strong>Expiry Date:</strong> {}</p>\
         <p><strong>Description:</strong> {}</p></div>\n",
        escape_html(&view.service_name),
        view.end_date,
        description
    ));
    body.push_str(
        "<p>Renew before the expiry date to keep uninterrupted access to your signals and reports.</p>\n",
    );
    body.push_str(&format!(
        "<div style=\"background: #28a745; color: white; padding: 20px; border-radius: 8px; text-align: center;\">\
         <h3 style=\"margin: 0 0 15px 0;\">Ready to Renew?</h3>\
         <p><strong>WhatsApp:</strong> <a href=\"{}\" style=\"color: white;\">{}</a></p>\
         <p><strong>Email:</strong> <a href=\"mailto:{}\" style=\"color: white;\">{}</a></p>\
         <p><strong>Website:</strong> <a href=\"{}\" style=\"color: white;\">{}</a></p></div>\n",
        business.whatsapp_link(),
        escape_html(&business.contact_phone),
        escape_html(&business.contact_email),
        escape_html(&business.contact_email),
        escape_html(&business.website),
        escape_html(&business.website),
    ));
    body.push_str(&format!(
        "<p>Thank you for being a valued member of the {} community!</p>\n",
        name
    ));
    body.push_str(&format!(
        "<div style=\"border-top: 2px solid #eee; padding-top: 20px;\">\
         <p style=\"margin: 0;\"><strong>{} Team</strong></p>\
         <p style=\"margin: 5px 0; color: #666;\">{}</p></div>\n",
        name,
        escape_html(&business.address)
    ));
    body.push_str(
        "<p style=\"font-size: 12px; color: #999; text-align: center;\">\
         This is an automated reminder. Please do not reply to this email.</p>\n",
    );
    body.push_str("</div>\n</body>\n</html>\n");

    RenderedMessage {
        subject: Some(email_subject(business, &view.service_name)),
        body,
    }
}

/// Plain text with WhatsApp `*bold*` and `_italic_` markup.
pub fn render_whatsapp(view: &SubscriptionView, business: &BusinessInfo) -> RenderedMessage {
    let body = format!(
        "🔔 *{business} Reminder*\n\
         \n\
         Hello {client}! 🙏\n\
         \n\
         Your *{service}* subscription expires on *{end}*.\n\
         \n\
         📈 *Don't miss out on:*\n\
         • Daily trading signals\n\
         • Gamma and delta exposure analysis\n\
         • Research reports\n\
         • Priority expert support\n\
         \n\
         💬 *Contact us to renew:*\n\
         📞 {phone}\n\
         ✉️ {email}\n\
         🌐 {website}\n\
         \n\
         Thank you for choosing {business}! 🚀\n\
         \n\
         _This is an automated reminder_",
        business = business.name,
        client = view.client_name,
        service = view.service_name,
        end = view.end_date,
        phone = business.contact_phone,
        email = business.contact_email,
        website = business.website,
    );

    RenderedMessage {
        subject: None,
        body,
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
