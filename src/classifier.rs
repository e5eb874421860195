//! Question Classifier
//!
//! Maps a free-text mortgage question to:
//! - a topic category (first matching rule wins, `general` otherwise)
//! - an edge-case flag for complicated borrower situations
//! - a crude sentiment signal
//!
//! Pure keyword heuristics. Case-insensitive, deterministic, no allocation
//! beyond the lower-cased copy and the keyword set.

use crate::models::{QuestionAnalysis, Sentiment, TopicCategory};
use std::collections::{BTreeSet, HashSet};

/// One routing rule. Matches if any phrase is a substring, any word is a
/// whole token, or both halves of any pair appear.
struct CategoryRule {
    category: TopicCategory,
    phrases: &'static [&'static str],
    words: &'static [&'static str],
    pairs: &'static [(&'static str, &'static str)],
}

/// Evaluated top to bottom. Order is behavior: citizenship beats income
/// verification beats credit, documents beats pre-approval, and so on.
const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: TopicCategory::Citizenship,
        phrases: &[
            "citizen", "green card", "permanent resident", "immigra",
            "non-resident", "nonresident", "foreign national", "work permit",
        ],
        words: &["visa", "itin", "daca", "h1b"],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::IncomeVerification,
        phrases: &[
            "verify income", "verify my income", "income verification",
            "proof of income", "prove my income", "prove income", "tax return",
            "filed taxes", "file taxes", "filed my taxes", "tax filing",
            "pay stub", "paystub", "w-2",
        ],
        words: &["w2"],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::SelfEmployed,
        phrases: &[
            "self-employed", "self employed", "own business", "own my business",
            "own a business", "business owner", "freelanc", "independent contractor",
            "gig work", "1099",
        ],
        words: &[],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::CreditIssues,
        phrases: &[
            "bankrupt", "foreclos", "collections", "bad credit", "poor credit",
            "low credit", "no credit", "late payment", "charge-off", "charge off",
            "repair my credit", "fix my credit", "judgment", "short sale",
        ],
        words: &[],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::Credit,
        phrases: &["credit"],
        words: &["fico"],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::Pmi,
        phrases: &["private mortgage insurance", "mortgage insurance"],
        words: &["pmi", "mip"],
        pairs: &[("avoid", "insurance")],
    },
    CategoryRule {
        category: TopicCategory::DownPayment,
        phrases: &[
            "down payment", "downpayment", "put down", "money down", "zero down",
            "% down",
        ],
        words: &[],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::Documents,
        phrases: &["document", "paperwork"],
        words: &[],
        pairs: &[("need", "provide")],
    },
    CategoryRule {
        category: TopicCategory::Dti,
        phrases: &["debt-to-income", "debt to income"],
        words: &["dti"],
        pairs: &[("debt", "income")],
    },
    CategoryRule {
        category: TopicCategory::Closing,
        phrases: &["closing", "fees", "escrow", "title insurance"],
        words: &[],
        pairs: &[("how much", "close")],
    },
    CategoryRule {
        category: TopicCategory::Rates,
        phrases: &["interest", "mortgage rate", "rate lock"],
        words: &["rate", "rates", "apr", "lock", "locked"],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::PreApproval,
        phrases: &[
            "pre-approv", "preapprov", "pre approv", "pre-qualif", "prequalif",
            "pre qualif", "approved for",
        ],
        words: &[],
        pairs: &[],
    },
    CategoryRule {
        category: TopicCategory::FirstTime,
        phrases: &[
            "first-time", "first time", "first home", "first house", "never owned",
        ],
        words: &[],
        pairs: &[],
    },
];

/// Distress / complication markers
const EDGE_CASE_PHRASES: &[&str] = &[
    // Non-citizen status
    "not a citizen", "not a us citizen", "not a u.s. citizen", "non-citizen",
    "noncitizen", "non-resident", "nonresident", "green card",
    // No tax filing history
    "haven't filed", "have not filed", "didn't file", "never filed", "not filed",
    "no tax return",
    // Self-employment
    "self-employed", "self employed",
    // Prior bankruptcy / foreclosure
    "bankrupt", "foreclos",
    // Zero down
    "no down payment", "zero down", "no money down", "0% down", "nothing down",
    // High existing debt
    "high debt", "lot of debt", "lots of debt", "too much debt",
];

const EDGE_CASE_WORDS: &[&str] = &["visa", "itin", "daca"];

const NEGATION_MARKERS: &[&str] = &["not", "can't", "cannot", "no ", "wasn't"];

impl CategoryRule {
    fn matches(&self, text: &str, tokens: &HashSet<&str>) -> bool {
        self.phrases.iter().any(|p| text.contains(p))
            || self.words.iter().any(|w| tokens.contains(w))
            || self
                .pairs
                .iter()
                .any(|(a, b)| text.contains(a) && text.contains(b))
    }
}

/// Question classifier
pub struct QuestionClassifier;

impl QuestionClassifier {
    /// Analyze a question into category, keywords, edge-case flag and sentiment
    pub fn analyze(question: &str) -> QuestionAnalysis {
        let text = question.to_lowercase();
        let tokens: HashSet<&str> = tokenize(&text).collect();

        let category = CATEGORY_RULES
            .iter()
            .find(|rule| rule.matches(&text, &tokens))
            .map(|rule| rule.category)
            .unwrap_or(TopicCategory::General);

        let is_edge_case = EDGE_CASE_PHRASES.iter().any(|p| text.contains(p))
            || EDGE_CASE_WORDS.iter().any(|w| tokens.contains(w));

        let sentiment = if NEGATION_MARKERS.iter().any(|m| text.contains(m)) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        QuestionAnalysis {
            category,
            keywords: extract_keywords(&text),
            is_edge_case,
            sentiment,
        }
    }
}

/// Shorthand for [`QuestionClassifier::analyze`]
pub fn analyze(question: &str) -> QuestionAnalysis {
    QuestionClassifier::analyze(question)
}

/// Lower-cased tokens longer than three characters
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .filter(|t| t.chars().count() > 3)
        .map(|t| t.to_lowercase())
        .collect()
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}
