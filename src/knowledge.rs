//! Topic Knowledge Store
//!
//! Static, read-only mapping from topic category to a curated answer.
//! Built at compile time; lookups never allocate and never change.

use crate::models::{CuratedAnswer, TopicCategory};
use std::collections::BTreeSet;

const GENERAL: CuratedAnswer = CuratedAnswer {
    summary: "Based on standard mortgage guidelines, lenders evaluate your ability to repay through income verification, credit history, and debt-to-income ratios. Typical requirements include stable employment, adequate income, and manageable debt levels.",
    highlights: &[
        "Most lenders look for two years of steady income and employment",
        "Credit score, down payment, and DTI together drive your rate and approval",
        "Getting pre-approved shows sellers you are a serious buyer",
        "A licensed loan officer can match you with the right loan program",
    ],
};

static TOPIC_TABLE: &[(TopicCategory, CuratedAnswer)] = &[
    (
        TopicCategory::Citizenship,
        CuratedAnswer {
            summary: "You do not need to be a U.S. citizen to get a mortgage. Permanent residents with a valid green card generally qualify for the same conventional, FHA, and VA-backed programs as citizens. Non-permanent residents can often qualify with a valid work visa (such as H-1B or L-1) and a documented history of U.S. income, and some lenders offer ITIN loan programs for borrowers without a Social Security number.",
            highlights: &[
                "Green card holders qualify for most conventional and FHA loans",
                "Non-permanent residents typically need a valid visa and EAD",
                "Lenders usually want two years of U.S. employment history",
                "ITIN loan programs exist but often require larger down payments",
            ],
        },
    ),
    (
        TopicCategory::IncomeVerification,
        CuratedAnswer {
            summary: "Lenders verify income to confirm you can afford the monthly payment. For salaried borrowers that usually means recent pay stubs, W-2 forms from the past two years, and a verbal verification of employment shortly before closing. If you have not filed tax returns, most conventional programs will be difficult, but bank-statement and asset-based programs may still be an option.",
            highlights: &[
                "Pay stubs covering the most recent 30 days",
                "W-2 forms from the past two years",
                "Lenders may pull IRS transcripts with your authorization",
                "Bonus, overtime, and commission income usually needs a two-year history",
                "Bank-statement programs can help borrowers without standard documentation",
            ],
        },
    ),
    (
        TopicCategory::Credit,
        CuratedAnswer {
            summary: "Your credit score is one of the biggest factors in both approval and pricing. Conventional loans typically need a 620 or higher score, FHA allows scores as low as 580 with 3.5% down, and VA loans have no official minimum though most lenders look for 620. Scores of 740 and above usually unlock the best rates.",
            highlights: &[
                "Conventional loans typically require 620+",
                "FHA allows 580+ with 3.5% down",
                "VA loans have no official minimum score",
                "740+ generally receives the best pricing",
            ],
        },
    ),
    (
        TopicCategory::DownPayment,
        CuratedAnswer {
            summary: "Down payment requirements depend on the loan program. Conventional loans start at 3% down for qualified first-time buyers, FHA requires 3.5% with a 580+ credit score, and VA and USDA loans can offer zero down for eligible borrowers. Putting 20% down on a conventional loan avoids private mortgage insurance.",
            highlights: &[
                "Conventional: as little as 3% down for qualified buyers",
                "FHA: 3.5% down with a 580+ credit score",
                "VA and USDA: 0% down for eligible borrowers",
                "Gift funds from family are allowed on most programs",
            ],
        },
    ),
    (
        TopicCategory::Documents,
        CuratedAnswer {
            summary: "For mortgage pre-approval, you'll typically need: recent pay stubs (last 2 months), W-2 forms from the past 2 years, 2-3 months of bank statements, tax returns if self-employed, and government-issued ID. Lenders use these to verify your income, assets, and employment history.",
            highlights: &[
                "Pay stubs from the last 30-60 days showing year-to-date income",
                "W-2 forms or 1099s from the past 2 years",
                "Bank statements for all accounts (2-3 months)",
                "Tax returns if you're self-employed or have rental income",
            ],
        },
    ),
    (
        TopicCategory::Pmi,
        CuratedAnswer {
            summary: "To avoid Private Mortgage Insurance (PMI) on a conventional loan, you need to put down at least 20% of the home's purchase price. For example, on a $400,000 home, that's $80,000 down. Alternatively, you can use a piggyback loan or lender-paid MI (which typically means a slightly higher rate).",
            highlights: &[
                "20% down payment eliminates PMI on conventional loans",
                "PMI typically costs 0.5-1% of the loan amount annually",
                "FHA loans require mortgage insurance regardless of down payment",
                "PMI can be removed once you reach 20% equity through payments or appreciation",
            ],
        },
    ),
    (
        TopicCategory::Dti,
        CuratedAnswer {
            summary: "Debt-to-Income (DTI) ratio compares your monthly debt payments to your gross monthly income. Most lenders prefer a DTI of 43% or lower, though some programs allow up to 50% with strong compensating factors like high credit score or significant assets.",
            highlights: &[
                "Front-end DTI (housing only): typically 28% or less",
                "Back-end DTI (all debts): typically 43% or less",
                "Calculate by dividing total monthly debts by gross monthly income",
                "Lower DTI improves your chances of approval and better rates",
            ],
        },
    ),
    (
        TopicCategory::Closing,
        CuratedAnswer {
            summary: "Closing costs typically range from 2-5% of the loan amount. They include: loan origination fees (0.5-1%), appraisal ($300-$600), title search and insurance ($500-$1,500), credit report fees, recording fees, and prepaid items like property taxes and homeowner's insurance.",
            highlights: &[
                "Expect 2-5% of the purchase price in closing costs",
                "You'll receive a Loan Estimate within 3 days of applying",
                "Closing Disclosure must be provided 3 business days before closing",
                "Some costs are negotiable or can be covered by the seller",
            ],
        },
    ),
    (
        TopicCategory::Rates,
        CuratedAnswer {
            summary: "Interest rates vary based on credit score, loan type, down payment, and market conditions. Rates can be locked for 30-60 days. A rate lock protects you from rate increases but you won't benefit if rates drop. Better credit scores (740+) typically get the best rates.",
            highlights: &[
                "Rates change daily based on market conditions",
                "Credit score heavily impacts your rate (740+ gets best pricing)",
                "Larger down payments often qualify for better rates",
                "Points can be paid to lower your rate (1 point = 1% of loan amount)",
            ],
        },
    ),
    (
        TopicCategory::PreApproval,
        CuratedAnswer {
            summary: "Pre-approval involves a lender reviewing your finances and credit to determine how much they'll lend you. It's stronger than pre-qualification and shows sellers you're a serious buyer. Pre-approval typically takes 1-3 days and is valid for 60-90 days.",
            highlights: &[
                "Pre-approval letters strengthen your offer to sellers",
                "Valid for 60-90 days, but can be updated",
                "Requires credit check and documentation verification",
                "Doesn't guarantee final loan approval (that comes after underwriting)",
            ],
        },
    ),
    (
        TopicCategory::FirstTime,
        CuratedAnswer {
            summary: "First-time buyers have more options than many expect. Conventional programs allow as little as 3% down, FHA loans accept lower credit scores, and many state and local housing agencies offer down payment assistance grants or forgivable second loans. Homebuyer education courses are often required and can unlock additional assistance.",
            highlights: &[
                "Programs available with as little as 3% down",
                "State and local down payment assistance is widely available",
                "A homebuyer education course is often required",
                "You generally count as first-time if you haven't owned in 3 years",
            ],
        },
    ),
    (
        TopicCategory::SelfEmployed,
        CuratedAnswer {
            summary: "Self-employed borrowers can absolutely get a mortgage, but income is documented differently. Lenders usually average your net business income from the last two years of personal and business tax returns. If write-offs make your taxable income low, bank-statement loans that use 12-24 months of deposits may be a better fit.",
            highlights: &[
                "Two years of personal and business tax returns are standard",
                "Lenders average net income, after business deductions",
                "A year-to-date profit and loss statement may be requested",
                "Bank-statement programs use 12-24 months of deposits instead",
            ],
        },
    ),
    (
        TopicCategory::CreditIssues,
        CuratedAnswer {
            summary: "Past credit problems don't permanently rule out homeownership. FHA typically allows a new mortgage 2 years after a Chapter 7 bankruptcy discharge and 3 years after a foreclosure, while conventional loans usually require 4 and 7 years respectively. Rebuilding with on-time payments and low card balances is the fastest way to improve your options.",
            highlights: &[
                "FHA: 2 years after Chapter 7 discharge, 3 years after foreclosure",
                "Conventional: 4 years after bankruptcy, 7 years after foreclosure",
                "Chapter 13 borrowers may qualify after 12 months of on-time plan payments",
                "Paying down revolving balances can raise your score quickly",
            ],
        },
    ),
    (TopicCategory::General, GENERAL),
];

/// General mortgage facts used when no curated highlight applies.
pub const GENERAL_INSIGHTS: &[&str] = &[
    "Most lenders require a debt-to-income (DTI) ratio at or below 43%. Strong compensating factors can support approvals up to 50%.",
    "To avoid PMI on conventional loans, you typically need a down payment of at least 20% of the home's purchase price.",
    "Common closing costs include origination fees (0.5-1% of loan), appraisal ($300-500), title insurance, and escrow deposits.",
    "Pre-approval typically requires: recent pay stubs, W-2s from the last 2 years, bank statements (2-3 months), and credit authorization.",
    "Interest rate locks are typically good for 30-60 days. Extended locks are available but cost more.",
    "The loan application process usually takes 30-45 days from application to closing.",
    "Conventional loans follow Fannie Mae/Freddie Mac limits ($766,550 for 2024 in most areas). FHA and VA have different limits.",
    "First-time buyers may qualify for programs with as little as 3% down payment.",
    "Credit score requirements: Conventional loans typically need 620+, FHA allows 580+, VA has no minimum.",
];

/// Curated answer for a category, if one exists
pub fn lookup(category: TopicCategory) -> Option<&'static CuratedAnswer> {
    TOPIC_TABLE
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, answer)| answer)
}

/// The `general` entry. Always present.
pub fn general() -> &'static CuratedAnswer {
    &GENERAL
}

/// Insights mentioning any of the keywords, in table order
pub fn matching_insights(keywords: &BTreeSet<String>) -> Vec<&'static str> {
    GENERAL_INSIGHTS
        .iter()
        .copied()
        .filter(|insight| {
            let lowered = insight.to_lowercase();
            keywords.iter().any(|kw| lowered.contains(kw.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::extract_keywords;

    #[test]
    fn test_every_category_has_entry() {
        for category in TopicCategory::ALL {
            let answer = lookup(category).expect("missing curated answer");
            assert!(!answer.summary.is_empty());
            assert!(
                (3..=6).contains(&answer.highlights.len()),
                "{} has {} highlights",
                category,
                answer.highlights.len()
            );
        }
    }

    #[test]
    fn test_general_lookup_is_the_general_constant() {
        assert_eq!(lookup(TopicCategory::General), Some(general()));
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let first = lookup(TopicCategory::Documents).unwrap();
        let second = lookup(TopicCategory::Documents).unwrap();
        assert_eq!(first.summary.as_bytes(), second.summary.as_bytes());
        assert_eq!(first.highlights, second.highlights);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_matching_insights() {
        let keywords = extract_keywords("are closing costs negotiable");
        let insights = matching_insights(&keywords);
        assert_eq!(insights.len(), 2);
        assert!(insights[0].starts_with("Common closing costs"));
        assert!(insights[1].starts_with("The loan application process"));

        assert!(matching_insights(&extract_keywords("penguins")).is_empty());
    }
}
