//! Mortgage payment calculator
//!
//! Standard fixed-rate amortization. A 0% rate divides the principal
//! evenly across the term.

use crate::error::AdvisorError;
use crate::models::PaymentEstimate;
use crate::Result;
use serde::Deserialize;

pub const MIN_LOAN_AMOUNT: f64 = 50_000.0;
pub const MAX_RATE: f64 = 20.0;
pub const MAX_TERM_YEARS: u32 = 40;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub loan_amount: f64,
    /// Annual rate in percent, e.g. 6.5
    pub rate: f64,
    pub term_years: u32,
}

impl PaymentRequest {
    pub fn validate(&self) -> Result<()> {
        if !self.loan_amount.is_finite() || self.loan_amount < MIN_LOAN_AMOUNT {
            return Err(AdvisorError::MalformedInput(format!(
                "loanAmount must be at least {}",
                MIN_LOAN_AMOUNT
            )));
        }
        if !self.rate.is_finite() || self.rate <= 0.0 || self.rate > MAX_RATE {
            return Err(AdvisorError::MalformedInput(format!(
                "rate must be greater than 0 and at most {}",
                MAX_RATE
            )));
        }
        if self.term_years == 0 || self.term_years > MAX_TERM_YEARS {
            return Err(AdvisorError::MalformedInput(format!(
                "termYears must be between 1 and {}",
                MAX_TERM_YEARS
            )));
        }
        Ok(())
    }
}

/// Validate and amortize
pub fn calculate_payment(request: &PaymentRequest) -> Result<PaymentEstimate> {
    request.validate()?;
    Ok(amortize(request.loan_amount, request.rate, request.term_years))
}

/// Unchecked amortization. All money values are rounded to cents.
pub fn amortize(loan_amount: f64, rate: f64, term_years: u32) -> PaymentEstimate {
    let months = term_years * 12;
    let n = f64::from(months);
    let monthly_rate = rate / 100.0 / 12.0;

    let monthly_payment = if monthly_rate == 0.0 {
        loan_amount / n
    } else {
        let factor = (1.0 + monthly_rate).powf(n);
        loan_amount * monthly_rate * factor / (factor - 1.0)
    };

    let total_paid = monthly_payment * n;
    let total_interest = total_paid - loan_amount;

    PaymentEstimate {
        monthly_payment: round_cents(monthly_payment),
        total_paid: round_cents(total_paid),
        total_interest: round_cents(total_interest),
        payoff_date_months: months,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// US dollar formatting: `$1,896.20`
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// One-line description shown alongside the estimate
pub fn describe(request: &PaymentRequest, estimate: &PaymentEstimate) -> String {
    format!(
        "Estimated payment is {} for {} years with {}% interest.",
        format_currency(estimate.monthly_payment),
        request.term_years,
        request.rate
    )
}
