//! Core data models for the mortgage advisor

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

//
// ================= Topic Categories =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicCategory {
    #[serde(rename = "citizenship")]
    Citizenship,
    #[serde(rename = "income_verification")]
    IncomeVerification,
    #[serde(rename = "credit")]
    Credit,
    #[serde(rename = "downpayment")]
    DownPayment,
    #[serde(rename = "documents")]
    Documents,
    #[serde(rename = "pmi")]
    Pmi,
    #[serde(rename = "dti")]
    Dti,
    #[serde(rename = "closing")]
    Closing,
    #[serde(rename = "rates")]
    Rates,
    #[serde(rename = "preapproval")]
    PreApproval,
    #[serde(rename = "firsttime")]
    FirstTime,
    #[serde(rename = "selfemployed")]
    SelfEmployed,
    #[serde(rename = "credit_issues")]
    CreditIssues,
    #[serde(rename = "general")]
    General,
}

impl TopicCategory {
    pub const ALL: [TopicCategory; 14] = [
        TopicCategory::Citizenship,
        TopicCategory::IncomeVerification,
        TopicCategory::Credit,
        TopicCategory::DownPayment,
        TopicCategory::Documents,
        TopicCategory::Pmi,
        TopicCategory::Dti,
        TopicCategory::Closing,
        TopicCategory::Rates,
        TopicCategory::PreApproval,
        TopicCategory::FirstTime,
        TopicCategory::SelfEmployed,
        TopicCategory::CreditIssues,
        TopicCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicCategory::Citizenship => "citizenship",
            TopicCategory::IncomeVerification => "income_verification",
            TopicCategory::Credit => "credit",
            TopicCategory::DownPayment => "downpayment",
            TopicCategory::Documents => "documents",
            TopicCategory::Pmi => "pmi",
            TopicCategory::Dti => "dti",
            TopicCategory::Closing => "closing",
            TopicCategory::Rates => "rates",
            TopicCategory::PreApproval => "preapproval",
            TopicCategory::FirstTime => "firsttime",
            TopicCategory::SelfEmployed => "selfemployed",
            TopicCategory::CreditIssues => "credit_issues",
            TopicCategory::General => "general",
        }
    }
}

impl fmt::Display for TopicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    /// Reserved; no rule produces it yet.
    Positive,
}

//
// ================= Question Analysis =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalysis {
    pub category: TopicCategory,
    pub keywords: BTreeSet<String>,
    pub is_edge_case: bool,
    pub sentiment: Sentiment,
}

//
// ================= Knowledge =================
//

/// Hand-authored answer for one topic. Lives in a static table.
#[derive(Debug, PartialEq, Eq)]
pub struct CuratedAnswer {
    pub summary: &'static str,
    pub highlights: &'static [&'static str],
}

//
// ================= Indicators =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub value: f64,
    pub observed_on: NaiveDate,
    pub series_label: String,
}

//
// ================= Advisor Answer =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub snippet: String,
}

impl Source {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorAnswer {
    pub summary: String,
    pub highlights: Vec<String>,
    pub sources: Vec<Source>,
    pub follow_ups: Vec<String>,
}

//
// ================= Payment Estimate =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEstimate {
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub payoff_date_months: u32,
}

//
// ================= Intake & Leads =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanPurpose {
    Purchase,
    Refinance,
    Cashout,
    Secondhome,
    Investment,
}

impl LoanPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanPurpose::Purchase => "purchase",
            LoanPurpose::Refinance => "refinance",
            LoanPurpose::Cashout => "cashout",
            LoanPurpose::Secondhome => "secondhome",
            LoanPurpose::Investment => "investment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanPurpose::Purchase => "Purchase",
            LoanPurpose::Refinance => "Rate/Term Refinance",
            LoanPurpose::Cashout => "Cash-out Refinance",
            LoanPurpose::Secondhome => "Second Home",
            LoanPurpose::Investment => "Investment Property",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Occupancy {
    Primary,
    Secondhome,
    Investment,
}

impl Occupancy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Occupancy::Primary => "primary",
            Occupancy::Secondhome => "secondhome",
            Occupancy::Investment => "investment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Occupancy::Primary => "Primary Residence",
            Occupancy::Secondhome => "Second Home",
            Occupancy::Investment => "Investment",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Singlefamily,
    Condo,
    Townhome,
    Multiunit,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Singlefamily => "singlefamily",
            PropertyType::Condo => "condo",
            PropertyType::Townhome => "townhome",
            PropertyType::Multiunit => "multiunit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Singlefamily => "Single Family",
            PropertyType::Condo => "Condo",
            PropertyType::Townhome => "Townhome",
            PropertyType::Multiunit => "2–4 Unit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntakeForm {
    pub purpose: LoanPurpose,
    pub occupancy: Occupancy,
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_down_payment: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub consent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake: Option<IntakeForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub lead_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub consent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRecord {
    pub intake_id: Uuid,
    #[serde(flatten)]
    pub form: IntakeForm,
    pub created_at: DateTime<Utc>,
}
