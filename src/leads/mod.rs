//! Lead and intake persistence
//!
//! In-memory by default; Postgres when a database URL is configured.
//! Contact details never reach the logs, only a short e-mail fingerprint.

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::models::{IntakeForm, IntakeRecord, LeadRecord, LeadSubmission};
use crate::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

pub mod notify;
pub mod postgres;

pub use notify::{build_notifier, LeadNotifier, LogNotifier, SendGridNotifier};
pub use postgres::PostgresLeadStore;

#[async_trait::async_trait]
pub trait LeadStore: Send + Sync {
    async fn save_lead(&self, lead: &LeadSubmission) -> Result<LeadRecord>;
    async fn save_intake(&self, form: &IntakeForm) -> Result<IntakeRecord>;
    async fn lead_count(&self) -> Result<usize>;
    async fn intake_count(&self) -> Result<usize>;
    fn backend(&self) -> &'static str;
}

/// In-memory store for development and tests
pub struct InMemoryLeadStore {
    leads: Arc<RwLock<Vec<LeadRecord>>>,
    intakes: Arc<RwLock<Vec<IntakeRecord>>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self {
            leads: Arc::new(RwLock::new(Vec::new())),
            intakes: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryLeadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn save_lead(&self, lead: &LeadSubmission) -> Result<LeadRecord> {
        let record = new_lead_record(lead);
        self.leads.write().await.push(record.clone());
        Ok(record)
    }

    async fn save_intake(&self, form: &IntakeForm) -> Result<IntakeRecord> {
        let record = new_intake_record(form);
        self.intakes.write().await.push(record.clone());
        Ok(record)
    }

    async fn lead_count(&self) -> Result<usize> {
        Ok(self.leads.read().await.len())
    }

    async fn intake_count(&self) -> Result<usize> {
        Ok(self.intakes.read().await.len())
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}

pub(crate) fn new_lead_record(lead: &LeadSubmission) -> LeadRecord {
    LeadRecord {
        lead_id: Uuid::new_v4(),
        full_name: lead.full_name.trim().to_string(),
        email: lead.email.trim().to_string(),
        phone: lead.phone.trim().to_string(),
        consent: lead.consent,
        created_at: Utc::now(),
    }
}

pub(crate) fn new_intake_record(form: &IntakeForm) -> IntakeRecord {
    IntakeRecord {
        intake_id: Uuid::new_v4(),
        form: form.clone(),
        created_at: Utc::now(),
    }
}

/// Postgres when `DATABASE_URL` is set and usable, in-memory otherwise
pub fn build_lead_store(config: &AdvisorConfig) -> Arc<dyn LeadStore> {
    if let Some(url) = &config.database_url {
        match PostgresLeadStore::connect_lazy(url) {
            Ok(store) => {
                info!("Lead store backend: postgres");
                return Arc::new(store);
            }
            Err(e) => {
                warn!("Failed to initialize postgres lead store, falling back to in-memory: {}", e);
            }
        }
    }

    info!("Lead store backend: in-memory");
    Arc::new(InMemoryLeadStore::new())
}

//
// ================= Validation =================
//

pub fn validate_intake(form: &IntakeForm) -> Result<()> {
    if matches!(form.est_price, Some(price) if price <= 0) {
        return Err(AdvisorError::MalformedInput(
            "estPrice must be a positive whole number".to_string(),
        ));
    }
    if matches!(form.est_down_payment, Some(down) if down < 0) {
        return Err(AdvisorError::MalformedInput(
            "estDownPayment must not be negative".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_lead(lead: &LeadSubmission) -> Result<()> {
    if lead.full_name.trim().chars().count() < 2 {
        return Err(AdvisorError::MalformedInput(
            "fullName must be at least 2 characters".to_string(),
        ));
    }
    if !is_valid_email(&lead.email) {
        return Err(AdvisorError::MalformedInput("email is not valid".to_string()));
    }
    if lead.phone.trim().chars().count() < 7 {
        return Err(AdvisorError::MalformedInput(
            "phone must be at least 7 characters".to_string(),
        ));
    }
    if !lead.consent {
        return Err(AdvisorError::MalformedInput("Consent is required".to_string()));
    }
    if let Some(intake) = &lead.intake {
        validate_intake(intake)?;
    }
    Ok(())
}

/// local@domain.tld, no whitespace
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Short SHA-256 fingerprint of an e-mail address for log correlation
pub fn fingerprint(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoanPurpose, Occupancy, PropertyType};

    fn submission() -> LeadSubmission {
        LeadSubmission {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-123-4567".to_string(),
            consent: true,
            intake: None,
        }
    }

    fn intake() -> IntakeForm {
        IntakeForm {
            purpose: LoanPurpose::Purchase,
            occupancy: Occupancy::Primary,
            property_type: PropertyType::Singlefamily,
            est_price: Some(450_000),
            est_down_payment: Some(0),
        }
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryLeadStore::new();

        let record = store.save_lead(&submission()).await.unwrap();
        assert_eq!(record.full_name, "Jane Doe");
        store.save_intake(&intake()).await.unwrap();
        store.save_intake(&intake()).await.unwrap();

        assert_eq!(store.lead_count().await.unwrap(), 1);
        assert_eq!(store.intake_count().await.unwrap(), 2);
        assert_eq!(store.backend(), "in-memory");
    }

    #[test]
    fn test_lead_validation() {
        assert!(validate_lead(&submission()).is_ok());

        let mut lead = submission();
        lead.full_name = " J ".to_string();
        assert!(validate_lead(&lead).is_err());

        let mut lead = submission();
        lead.phone = "555".to_string();
        assert!(validate_lead(&lead).is_err());

        let mut lead = submission();
        lead.consent = false;
        let err = validate_lead(&lead).unwrap_err();
        assert!(err.to_string().contains("Consent is required"));

        let mut lead = submission();
        lead.intake = Some(IntakeForm {
            est_price: Some(0),
            ..intake()
        });
        assert!(validate_lead(&lead).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("jane.doe+home@mail.example.co"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@@example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("jane@.com"));
        assert!(!is_valid_email("jane@example."));
    }

    #[test]
    fn test_intake_validation() {
        assert!(validate_intake(&intake()).is_ok());
        assert!(validate_intake(&IntakeForm {
            est_down_payment: Some(-1),
            ..intake()
        })
        .is_err());
    }

    #[test]
    fn test_fingerprint_is_stable_and_redacted() {
        let a = fingerprint("Jane@Example.com ");
        let b = fingerprint("jane@example.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(!a.contains("jane"));
    }

    #[test]
    fn test_default_config_uses_memory() {
        let store = build_lead_store(&AdvisorConfig::default());
        assert_eq!(store.backend(), "in-memory");
        assert_eq!(tokio_test::block_on(store.lead_count()).unwrap(), 0);
    }
}
