//! Suggested next questions per topic category

use crate::models::TopicCategory;

pub const MAX_FOLLOW_UPS: usize = 3;

const GENERIC: &[&str] = &[
    "Would you like to calculate your estimated monthly payment?",
    "What are current interest rates?",
    "Ready to discuss the pre-qualification process?",
];

fn suggestions(category: TopicCategory) -> &'static [&'static str] {
    match category {
        TopicCategory::Citizenship => &[
            "What documents will I need?",
            "How much do I need for a down payment?",
            "Ready to discuss the pre-qualification process?",
        ],
        TopicCategory::IncomeVerification => &[
            "What documents will I need?",
            "How is my debt-to-income ratio calculated?",
        ],
        TopicCategory::Credit => &[
            "What are current interest rates?",
            "How much do I need for a down payment?",
            "Would you like to calculate your estimated monthly payment?",
        ],
        TopicCategory::DownPayment => &[
            "How can I avoid paying PMI?",
            "Are there first-time buyer assistance programs?",
            "Would you like to calculate your estimated monthly payment?",
        ],
        TopicCategory::Documents => &[
            "How long does pre-approval take?",
            "Ready to discuss the pre-qualification process?",
        ],
        TopicCategory::Pmi => &[
            "How much do I need for a down payment?",
            "Would you like to calculate your estimated monthly payment?",
        ],
        TopicCategory::Dti => &[
            "Would you like to calculate your estimated monthly payment?",
            "What documents will I need?",
            "Ready to discuss the pre-qualification process?",
        ],
        TopicCategory::Closing => &[
            "How can I avoid paying PMI?",
            "Would you like to calculate your estimated monthly payment?",
            "What documents will I need?",
        ],
        TopicCategory::Rates => &[
            "Would you like to calculate your estimated monthly payment?",
            "What documents will I need?",
            "Ready to discuss the pre-qualification process?",
        ],
        TopicCategory::PreApproval => &[
            "What documents will I need?",
            "What are current interest rates?",
            "Would you like to calculate your estimated monthly payment?",
        ],
        TopicCategory::FirstTime => &[
            "How much do I need for a down payment?",
            "What credit score do I need?",
            "Ready to discuss the pre-qualification process?",
        ],
        TopicCategory::SelfEmployed => &[
            "What documents will I need?",
            "Would a bank-statement loan work for me?",
        ],
        TopicCategory::CreditIssues => &[
            "How much do I need for a down payment?",
            "What credit score do I need?",
            "Ready to discuss the pre-qualification process?",
        ],
        TopicCategory::General => GENERIC,
    }
}

/// Up to three distinct suggestions for the category, in declared order
pub fn for_category(category: TopicCategory) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_FOLLOW_UPS);
    for suggestion in suggestions(category) {
        if out.len() == MAX_FOLLOW_UPS {
            break;
        }
        if !out.iter().any(|s| s == suggestion) {
            out.push(suggestion.to_string());
        }
    }
    out
}
