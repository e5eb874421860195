//! Lead notification
//!
//! SendGrid when an API key is configured, a log line otherwise.
//! Callers treat notification failures as non-fatal.

use super::fingerprint;
use crate::calculator::format_currency;
use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::models::{IntakeForm, LeadRecord};
use crate::Result;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const SENDER_NAME: &str = "MortgageBroker App";

#[async_trait::async_trait]
pub trait LeadNotifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, lead: &LeadRecord, intake: Option<&IntakeForm>) -> Result<()>;
}

/// Logs a redacted line instead of sending mail
pub struct LogNotifier {
    recipient: String,
}

impl LogNotifier {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

#[async_trait::async_trait]
impl LeadNotifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, lead: &LeadRecord, intake: Option<&IntakeForm>) -> Result<()> {
        info!(
            lead_id = %lead.lead_id,
            email_fp = %fingerprint(&lead.email),
            has_intake = intake.is_some(),
            recipient = %self.recipient,
            "Lead captured; e-mail delivery not configured"
        );
        Ok(())
    }
}

pub struct SendGridNotifier {
    client: Client,
    api_key: String,
    from: String,
    to: String,
    endpoint: String,
}

impl SendGridNotifier {
    pub fn new(api_key: String, from: String, to: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            api_key,
            from,
            to,
            endpoint: SENDGRID_URL.to_string(),
        })
    }

    fn message(&self, lead: &LeadRecord, intake: Option<&IntakeForm>) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from, "name": SENDER_NAME },
            "reply_to": { "email": lead.email },
            "subject": subject(lead),
            "content": [
                { "type": "text/plain", "value": text_body(lead, intake) },
                { "type": "text/html", "value": html_body(lead, intake) },
            ],
        })
    }
}

#[async_trait::async_trait]
impl LeadNotifier for SendGridNotifier {
    fn name(&self) -> &str {
        "sendgrid"
    }

    async fn notify(&self, lead: &LeadRecord, intake: Option<&IntakeForm>) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.message(lead, intake))
            .send()
            .await
            .map_err(|e| {
                error!("SendGrid request failed: {}", e);
                AdvisorError::Notification(format!("SendGrid request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "SendGrid error response: {}", body);
            return Err(AdvisorError::Notification(format!(
                "SendGrid returned {}",
                status
            )));
        }

        info!(lead_id = %lead.lead_id, email_fp = %fingerprint(&lead.email), "Lead e-mail sent");
        Ok(())
    }
}

/// SendGrid when a key is configured, logging otherwise
pub fn build_notifier(config: &AdvisorConfig) -> Arc<dyn LeadNotifier> {
    let Some(api_key) = config.sendgrid_api_key.clone() else {
        warn!("SENDGRID_API_KEY not configured - leads will be logged only");
        return Arc::new(LogNotifier::new(config.lead_email_to.clone()));
    };

    let from = config
        .sendgrid_from
        .clone()
        .unwrap_or_else(|| config.lead_email_to.clone());

    match SendGridNotifier::new(api_key, from, config.lead_email_to.clone()) {
        Ok(notifier) => {
            info!("Lead notifier: sendgrid");
            Arc::new(notifier)
        }
        Err(e) => {
            warn!("Failed to build SendGrid client, leads will be logged only: {}", e);
            Arc::new(LogNotifier::new(config.lead_email_to.clone()))
        }
    }
}

fn subject(lead: &LeadRecord) -> String {
    format!("New Mortgage Lead: {}", lead.full_name)
}

fn whole_dollars(amount: i64) -> String {
    let formatted = format_currency(amount as f64);
    formatted
        .strip_suffix(".00")
        .map(str::to_string)
        .unwrap_or(formatted)
}

/// Label/value pairs for the intake section
fn intake_fields(intake: &IntakeForm) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Loan Purpose", intake.purpose.label().to_string()),
        ("Occupancy", intake.occupancy.label().to_string()),
        ("Property Type", intake.property_type.label().to_string()),
    ];
    if let Some(price) = intake.est_price.filter(|p| *p > 0) {
        fields.push(("Estimated Price", whole_dollars(price)));
    }
    if let Some(down) = intake.est_down_payment.filter(|d| *d > 0) {
        fields.push(("Estimated Down Payment", whole_dollars(down)));
    }
    fields
}

fn text_body(lead: &LeadRecord, intake: Option<&IntakeForm>) -> String {
    let mut out = String::from("New Mortgage Lead from MortgageBroker App\n\n");
    out.push_str("CONTACT INFORMATION:\n");
    out.push_str(&format!("Full Name: {}\n", lead.full_name));
    out.push_str(&format!("Email: {}\n", lead.email));
    out.push_str(&format!("Phone: {}\n", lead.phone));

    if let Some(intake) = intake {
        out.push_str("\nLOAN PREFERENCES:\n");
        for (label, value) in intake_fields(intake) {
            out.push_str(&format!("{}: {}\n", label, value));
        }
    }

    out.push_str(&format!(
        "\nTCPA Consent: {}\n\nSubmitted: {}\n\n",
        if lead.consent { "Yes" } else { "No" },
        lead.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str("This lead was captured through the MortgageBroker ChatGPT integration.\n");
    out.push_str("Next Steps: Follow up within 24 hours for best conversion rates.");
    out
}

fn html_body(lead: &LeadRecord, intake: Option<&IntakeForm>) -> String {
    let field = |label: &str, value: &str| {
        format!(
            "<div class=\"field\"><span class=\"field-label\">{}:</span> <span class=\"field-value\">{}</span></div>",
            label,
            escape_html(value)
        )
    };

    let mut body = String::new();
    body.push_str("<h3>Contact Information</h3>");
    body.push_str(&field("Full Name", &lead.full_name));
    body.push_str(&field("Email", &lead.email));
    body.push_str(&field("Phone", &lead.phone));

    if let Some(intake) = intake {
        body.push_str("<h3>Loan Preferences</h3>");
        for (label, value) in intake_fields(intake) {
            body.push_str(&field(label, &value));
        }
    }

    body.push_str(&format!(
        "<div class=\"consent\"><strong>TCPA Consent:</strong> {}</div>",
        if lead.consent {
            "Yes, explicit consent provided"
        } else {
            "No"
        }
    ));
    body.push_str(&format!(
        "<div class=\"timestamp\"><strong>Submitted:</strong> {}</div>",
        lead.created_at.format("%A, %B %-d, %Y %H:%M UTC")
    ));

    format!(
        "<!DOCTYPE html><html><body><h2>New Mortgage Lead from MortgageBroker App</h2>{}</body></html>",
        body
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoanPurpose, Occupancy, PropertyType};
    use chrono::Utc;
    use uuid::Uuid;

    fn lead() -> LeadRecord {
        LeadRecord {
            lead_id: Uuid::new_v4(),
            full_name: "Jane <Doe>".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-123-4567".to_string(),
            consent: true,
            created_at: Utc::now(),
        }
    }

    fn intake() -> IntakeForm {
        IntakeForm {
            purpose: LoanPurpose::Cashout,
            occupancy: Occupancy::Secondhome,
            property_type: PropertyType::Multiunit,
            est_price: Some(450_000),
            est_down_payment: None,
        }
    }

    #[test]
    fn test_message_shape() {
        let notifier = SendGridNotifier::new(
            "SG.test".into(),
            "leads@mortgagebroker.app".into(),
            "officer@example.com".into(),
        )
        .unwrap();
        let message = notifier.message(&lead(), Some(&intake()));

        assert_eq!(message["subject"], "New Mortgage Lead: Jane <Doe>");
        assert_eq!(message["personalizations"][0]["to"][0]["email"], "officer@example.com");
        assert_eq!(message["reply_to"]["email"], "jane@example.com");
        assert_eq!(message["from"]["name"], "MortgageBroker App");

        let html = message["content"][1]["value"].as_str().unwrap();
        assert!(html.contains("Jane &lt;Doe&gt;"));
    }

    #[test]
    fn test_text_body_uses_labels() {
        let text = text_body(&lead(), Some(&intake()));
        assert!(text.contains("Loan Purpose: Cash-out Refinance"));
        assert!(text.contains("Occupancy: Second Home"));
        assert!(text.contains("Property Type: 2–4 Unit"));
        assert!(text.contains("Estimated Price: $450,000"));
        assert!(!text.contains("Estimated Down Payment"));
        assert!(text.contains("TCPA Consent: Yes"));

        assert!(!text_body(&lead(), None).contains("LOAN PREFERENCES"));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier::new("officer@example.com");
        assert!(notifier.notify(&lead(), None).await.is_ok());
        assert_eq!(notifier.name(), "log");
    }

    #[test]
    fn test_build_notifier_without_key() {
        let notifier = build_notifier(&AdvisorConfig::default());
        assert_eq!(notifier.name(), "log");
    }
}
