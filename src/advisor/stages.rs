//! Priority-chain stages and the answers they compose
//!
//! Each fallible stage either answers or lets the next one try. Generic
//! guidance sits outside the chain and always answers.

use super::follow_ups;
use crate::indicators::IndicatorBundle;
use crate::knowledge;
use crate::models::{AdvisorAnswer, QuestionAnalysis, Source, TopicCategory};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_INDICATOR_HIGHLIGHTS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    IndicatorFirst,
    CuratedMatch,
    GenerativeFallback,
    GenericGuidance,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::IndicatorFirst => "indicator_first",
            Stage::CuratedMatch => "curated_match",
            Stage::GenerativeFallback => "generative_fallback",
            Stage::GenericGuidance => "generic_guidance",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages tried in order before generic guidance
pub const PRIORITY_CHAIN: [Stage; 3] = [
    Stage::IndicatorFirst,
    Stage::CuratedMatch,
    Stage::GenerativeFallback,
];

#[derive(Debug)]
pub enum StageOutcome {
    Answered(AdvisorAnswer),
    Continue,
}

/// Indicator digest first, curated context and highlights after it
pub fn indicator_answer(bundle: &IndicatorBundle, analysis: &QuestionAnalysis) -> AdvisorAnswer {
    let mut summary = bundle.digest();

    let curated = match analysis.category {
        TopicCategory::Rates | TopicCategory::General => None,
        category => knowledge::lookup(category),
    };

    let highlights: Vec<String> = match curated {
        Some(answer) => {
            summary.push_str("\n\n**Additional Context:**\n");
            summary.push_str(answer.summary);
            answer
                .highlights
                .iter()
                .take(MAX_INDICATOR_HIGHLIGHTS)
                .map(|h| h.to_string())
                .collect()
        }
        None => knowledge::matching_insights(&analysis.keywords)
            .into_iter()
            .take(MAX_INDICATOR_HIGHLIGHTS)
            .map(str::to_string)
            .collect(),
    };

    AdvisorAnswer {
        summary,
        highlights,
        sources: vec![
            Source::new(
                "FRED (Federal Reserve Economic Data)",
                "Official real-time data from the St. Louis Federal Reserve - PRIMARY SOURCE",
            ),
            Source::new(
                "Market Analysis",
                "Current economic conditions and mortgage market trends",
            ),
        ],
        follow_ups: follow_ups::for_category(analysis.category),
    }
}

/// Curated entry verbatim. `general` is left to the later stages.
pub fn curated_answer(analysis: &QuestionAnalysis) -> Option<AdvisorAnswer> {
    if analysis.category == TopicCategory::General {
        return None;
    }

    let curated = knowledge::lookup(analysis.category)?;

    Some(AdvisorAnswer {
        summary: curated.summary.to_string(),
        highlights: curated.highlights.iter().map(|h| h.to_string()).collect(),
        sources: vec![
            Source::new(
                "Mortgage Guidelines",
                format!("Industry-standard practices for {}", analysis.category),
            ),
            Source::new("Lender Requirements", "Common requirements across major lenders"),
        ],
        follow_ups: follow_ups::for_category(analysis.category),
    })
}

/// Context handed to the generative fallback: any digest, then general guidance
pub fn generative_context(bundle: Option<&IndicatorBundle>) -> String {
    let general = knowledge::general().summary;
    match bundle {
        Some(bundle) => format!("{}\n\n{}", bundle.digest(), general),
        None => general.to_string(),
    }
}

pub fn generative_answer(text: String, category: TopicCategory) -> AdvisorAnswer {
    AdvisorAnswer {
        summary: text,
        highlights: vec![
            "Information is general guidance, not financial or legal advice".to_string(),
            format!("Speak with a licensed loan officer ({}) for a personalized quote", crate::guardrails::LICENSE_ID),
            "Equal Housing Lender".to_string(),
        ],
        sources: vec![
            Source::new(
                "AI Mortgage Assistant",
                "Generated answer restricted to mortgage and real estate topics",
            ),
            Source::new(
                "Mortgage Guidelines",
                "Grounded in standard mortgage lending practices",
            ),
        ],
        follow_ups: follow_ups::for_category(category),
    }
}

/// Total: any question gets the general answer with its text echoed back
pub fn generic_guidance(question: &str) -> AdvisorAnswer {
    let general = knowledge::general();

    AdvisorAnswer {
        summary: format!("You asked: \"{}\"\n\n{}", question.trim(), general.summary),
        highlights: general.highlights.iter().map(|h| h.to_string()).collect(),
        sources: vec![
            Source::new("Industry Guidelines", "Standard mortgage lending practices"),
            Source::new("Federal Requirements", "CFPB and federal lending regulations"),
        ],
        follow_ups: follow_ups::for_category(TopicCategory::General),
    }
}
