//! Answer composition orchestrator
//!
//! QUESTION → INDICATORS → CURATED → GENERATIVE → GENERIC GUIDANCE
//!
//! Stages run in a fixed priority order; the first that answers wins.
//! Stage failures are logged and absorbed, so `respond` is total.

use crate::classifier;
use crate::config::AdvisorConfig;
use crate::guardrails::GuardedFallback;
use crate::indicators::{IndicatorBundle, IndicatorLookup};
use crate::models::{AdvisorAnswer, QuestionAnalysis, TopicCategory};
use crate::Result;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub mod follow_ups;
pub mod stages;

pub use stages::{Stage, StageOutcome, PRIORITY_CHAIN};

#[derive(Debug, Clone)]
pub struct AdvisorOptions {
    /// Never call the generative fallback
    pub curated_only: bool,
    pub fallback_timeout: Duration,
}

impl Default for AdvisorOptions {
    fn default() -> Self {
        Self {
            curated_only: false,
            fallback_timeout: Duration::from_secs(10),
        }
    }
}

/// Final answer plus how it was produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorOutcome {
    pub stage: Stage,
    pub analysis: QuestionAnalysis,
    pub answer: AdvisorAnswer,
}

/// Per-request state carried between stages
struct RequestContext<'a> {
    question: &'a str,
    analysis: QuestionAnalysis,
    indicators: Option<IndicatorBundle>,
}

pub struct MortgageAdvisor {
    indicators: IndicatorLookup,
    fallback: GuardedFallback,
    options: AdvisorOptions,
}

impl MortgageAdvisor {
    pub fn new(indicators: IndicatorLookup, fallback: GuardedFallback, options: AdvisorOptions) -> Self {
        Self {
            indicators,
            fallback,
            options,
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let advisor = Self::new(
            IndicatorLookup::from_config(config)?,
            GuardedFallback::from_config(config)?,
            AdvisorOptions {
                curated_only: config.curated_only,
                fallback_timeout: config.fallback_timeout,
            },
        );

        info!(
            indicators = advisor.indicators.available(),
            fallback = advisor.fallback.available(),
            curated_only = advisor.options.curated_only,
            "Mortgage advisor initialized"
        );

        Ok(advisor)
    }

    /// Answer a question. Never fails.
    pub async fn answer(&self, question: &str) -> AdvisorAnswer {
        self.respond(question).await.answer
    }

    /// Run the priority chain and report which stage answered
    pub async fn respond(&self, question: &str) -> AdvisorOutcome {
        let start = Instant::now();
        let mut ctx = RequestContext {
            question,
            analysis: classifier::analyze(question),
            indicators: None,
        };

        debug!(
            category = %ctx.analysis.category,
            edge_case = ctx.analysis.is_edge_case,
            sentiment = ?ctx.analysis.sentiment,
            "Question classified"
        );

        for stage in PRIORITY_CHAIN {
            if let StageOutcome::Answered(answer) = self.run_stage(stage, &mut ctx).await {
                return finish(stage, ctx.analysis, answer, start);
            }
        }

        let answer = stages::generic_guidance(ctx.question);
        finish(Stage::GenericGuidance, ctx.analysis, answer, start)
    }

    async fn run_stage(&self, stage: Stage, ctx: &mut RequestContext<'_>) -> StageOutcome {
        match stage {
            Stage::IndicatorFirst => {
                ctx.indicators = self.indicators.lookup(ctx.question).await;
                match &ctx.indicators {
                    Some(bundle) => {
                        StageOutcome::Answered(stages::indicator_answer(bundle, &ctx.analysis))
                    }
                    None => StageOutcome::Continue,
                }
            }
            Stage::CuratedMatch => match stages::curated_answer(&ctx.analysis) {
                Some(answer) => StageOutcome::Answered(answer),
                None => StageOutcome::Continue,
            },
            Stage::GenerativeFallback => self.generative(ctx).await,
            Stage::GenericGuidance => StageOutcome::Answered(stages::generic_guidance(ctx.question)),
        }
    }

    async fn generative(&self, ctx: &RequestContext<'_>) -> StageOutcome {
        if ctx.analysis.category != TopicCategory::General
            || self.options.curated_only
            || !self.fallback.available()
        {
            return StageOutcome::Continue;
        }

        let context = stages::generative_context(ctx.indicators.as_ref());
        let call = self.fallback.ask(ctx.question, Some(context.as_str()));

        match tokio::time::timeout(self.options.fallback_timeout, call).await {
            Ok(Ok(text)) => StageOutcome::Answered(stages::generative_answer(text, ctx.analysis.category)),
            Ok(Err(e)) => {
                warn!(recoverable = e.is_recoverable(), "Generative fallback failed, using generic guidance: {}", e);
                StageOutcome::Continue
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.options.fallback_timeout.as_millis() as u64,
                    "Generative fallback timed out, using generic guidance"
                );
                StageOutcome::Continue
            }
        }
    }
}

fn finish(stage: Stage, analysis: QuestionAnalysis, answer: AdvisorAnswer, start: Instant) -> AdvisorOutcome {
    info!(
        stage = %stage,
        category = %analysis.category,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Advisor answered"
    );

    AdvisorOutcome {
        stage,
        analysis,
        answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrails::tests::{Reply, ScriptedClient};
    use crate::guardrails::OFF_TOPIC_REFUSAL;
    use crate::indicators::tests::StubSource;
    use crate::knowledge;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn advisor(
        source: Option<Arc<StubSource>>,
        client: Option<Arc<ScriptedClient>>,
        options: AdvisorOptions,
    ) -> MortgageAdvisor {
        let source = source.map(|s| s as Arc<dyn crate::indicators::ObservationSource>);
        let client = client.map(|c| c as Arc<dyn crate::llm::CompletionClient>);
        MortgageAdvisor::new(
            IndicatorLookup::new(source, Duration::from_millis(200)),
            GuardedFallback::new(client),
            options,
        )
    }

    fn offline() -> MortgageAdvisor {
        advisor(None, None, AdvisorOptions::default())
    }

    #[tokio::test]
    async fn test_documents_scenario() {
        let outcome = offline().respond("What documents do I need for pre-approval?").await;

        assert_eq!(outcome.stage, Stage::CuratedMatch);
        assert_eq!(outcome.analysis.category, TopicCategory::Documents);

        let curated = knowledge::lookup(TopicCategory::Documents).unwrap();
        assert_eq!(outcome.answer.summary, curated.summary);
        assert!((3..=6).contains(&outcome.answer.highlights.len()));
        assert_eq!(outcome.answer.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_indicators_take_priority_over_curated_rates() {
        let advisor = advisor(Some(Arc::new(StubSource::rates())), None, AdvisorOptions::default());
        let outcome = advisor.respond("What are current mortgage rates?").await;

        assert_eq!(outcome.stage, Stage::IndicatorFirst);
        assert!(outcome
            .answer
            .summary
            .starts_with("**Current Mortgage Rates (from FRED)**:"));
        assert!(outcome.answer.summary.contains("6.08%"));
        // rates curated text is not merged
        assert!(!outcome.answer.summary.contains("Additional Context"));
        assert_eq!(outcome.answer.sources[0].title, "FRED (Federal Reserve Economic Data)");
        assert!(outcome.answer.highlights.len() <= 3);
    }

    #[tokio::test]
    async fn test_indicator_answer_merges_curated_context() {
        let advisor = advisor(Some(Arc::new(StubSource::rates())), None, AdvisorOptions::default());
        let outcome = advisor
            .respond("Does my credit score change the interest rate I get?")
            .await;

        assert_eq!(outcome.stage, Stage::IndicatorFirst);
        assert_eq!(outcome.analysis.category, TopicCategory::Credit);

        let digest_end = outcome.answer.summary.find("**Additional Context:**").unwrap();
        assert!(outcome.answer.summary[..digest_end].contains("30-Year Fixed"));
        assert!(outcome
            .answer
            .summary
            .ends_with(knowledge::lookup(TopicCategory::Credit).unwrap().summary));
        assert_eq!(outcome.answer.highlights.len(), 3);
    }

    #[tokio::test]
    async fn test_chain_exhaustion_returns_generic_guidance() {
        let question = "zxqv blorp";
        let outcome = offline().respond(question).await;

        assert_eq!(outcome.stage, Stage::GenericGuidance);
        assert_eq!(outcome.analysis.category, TopicCategory::General);
        assert_eq!(
            outcome.answer.summary,
            format!("You asked: \"{}\"\n\n{}", question, knowledge::general().summary)
        );
        assert_eq!(outcome.answer.follow_ups.len(), 3);
    }

    #[tokio::test]
    async fn test_generative_stage_for_general_questions() {
        let client = Arc::new(ScriptedClient::new(Reply::Text(
            "An appraisal confirms the home is worth the loan amount.",
        )));
        let advisor = advisor(None, Some(client.clone()), AdvisorOptions::default());

        let outcome = advisor.respond("How does a home appraisal work?").await;

        assert_eq!(outcome.stage, Stage::GenerativeFallback);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.answer.highlights.len(), 3);

        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert!(request.user.contains(knowledge::general().summary));
    }

    #[tokio::test]
    async fn test_curated_match_skips_generative() {
        let client = Arc::new(ScriptedClient::new(Reply::Text("unused")));
        let advisor = advisor(None, Some(client.clone()), AdvisorOptions::default());

        let outcome = advisor.respond("How do I avoid PMI?").await;

        assert_eq!(outcome.stage, Stage::CuratedMatch);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_curated_only_mode_never_calls_fallback() {
        let client = Arc::new(ScriptedClient::new(Reply::Text("unused")));
        let options = AdvisorOptions {
            curated_only: true,
            ..AdvisorOptions::default()
        };
        let advisor = advisor(None, Some(client.clone()), options);

        let outcome = advisor.respond("How does a home appraisal work?").await;

        assert_eq!(outcome.stage, Stage::GenericGuidance);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_failure_falls_through() {
        let client = Arc::new(ScriptedClient::new(Reply::Broken));
        let advisor = advisor(None, Some(client.clone()), AdvisorOptions::default());

        let outcome = advisor.respond("How does a home appraisal work?").await;

        assert_eq!(outcome.stage, Stage::GenericGuidance);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_fallback_falls_through_at_deadline() {
        let client = Arc::new(ScriptedClient::new(Reply::Slow(
            Duration::from_secs(5),
            "too late",
        )));
        let options = AdvisorOptions {
            fallback_timeout: Duration::from_millis(30),
            ..AdvisorOptions::default()
        };
        let advisor = advisor(None, Some(client.clone()), options);

        let outcome = advisor.respond("How does a home appraisal work?").await;

        assert_eq!(outcome.stage, Stage::GenericGuidance);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(outcome.answer.summary.starts_with("You asked:"));
    }

    #[tokio::test]
    async fn test_off_topic_general_question_gets_refusal() {
        let client = Arc::new(ScriptedClient::new(Reply::Text("unused")));
        let advisor = advisor(None, Some(client.clone()), AdvisorOptions::default());

        let outcome = advisor.respond("What's a good stock to buy?").await;

        assert_eq!(outcome.stage, Stage::GenerativeFallback);
        assert_eq!(outcome.answer.summary, OFF_TOPIC_REFUSAL);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_total_coverage() {
        let advisor = offline();
        for question in [
            "?",
            "a",
            "What is DTI and how is it calculated?",
            "I'm not a US citizen, can I get a mortgage?",
            "How much are closing costs?",
            "I'm self-employed, can I qualify?",
            "Is a 580 FICO enough?",
            "What's the weather like?",
        ] {
            let answer = advisor.answer(question).await;
            assert!(!answer.summary.is_empty(), "{}", question);
            assert!(answer.follow_ups.len() <= 3, "{}", question);
        }
    }

    #[tokio::test]
    async fn test_outcome_serializes_camel_case() {
        let outcome = offline().respond("I'm not a US citizen, can I get a mortgage?").await;
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["stage"], "curated_match");
        assert_eq!(json["analysis"]["category"], "citizenship");
        assert_eq!(json["analysis"]["isEdgeCase"], true);
        assert!(json["answer"]["followUps"].is_array());
    }
}
