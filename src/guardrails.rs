//! Guarded Generative Fallback
//!
//! Wraps a completion client with topic gating:
//! 1. Pre-filter: off-topic questions get the fixed refusal, no network call
//! 2. System instruction: allowed topics, refusal wording, compliance rules
//! 3. Post-filter: a refusal coming back is logged and passed through as-is
//!
//! The allow-list is independent of the classifier's routing rules.

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::llm::{CompletionClient, CompletionRequest, OpenAiClient};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const OFF_TOPIC_REFUSAL: &str = "I can only answer mortgage and real estate questions. Please ask about home loans, mortgages, buying/selling property, or real estate topics.";

/// Stable prefix used to recognize a refusal in model output
const REFUSAL_MARKER: &str = "I can only answer mortgage and real estate questions";

pub const HIGH_DEMAND_MESSAGE: &str =
    "I'm currently experiencing high demand. Please try again in a moment.";

pub const TIMEOUT_MESSAGE: &str =
    "The request timed out. Please try asking your question again.";

pub const LICENSE_ID: &str = "NMLS #2459410";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 800;
const TOP_P: f32 = 0.9;
const FREQUENCY_PENALTY: f32 = 0.3;
const PRESENCE_PENALTY: f32 = 0.3;

/// Substring allow-list for the pre-filter
const ALLOWED_KEYWORDS: &[&str] = &[
    // Loan types
    "mortgage", "loan", "refinance", "fha", "va", "usda", "conventional", "jumbo",
    // Property & transaction
    "home", "house", "property", "real estate", "buyer", "seller", "purchase",
    "down payment", "closing", "escrow", "title", "appraisal", "inspection",
    "listing", "offer", "contract", "short sale", "foreclosure", "rental",
    "investment", "housing", "equity",
    // Qualification
    "rate", "interest", "credit", "pre-approval", "pre-qualification", "pmi",
    "mip", "dti", "debt", "income",
];

const SYSTEM_INSTRUCTION: &str = r#"You are a STRICT mortgage and real estate expert assistant. Your ONLY purpose is to answer questions about:

**ALLOWED TOPICS:**
- Mortgages (conventional, FHA, VA, USDA, jumbo, etc.)
- Home loans and refinancing
- Mortgage rates and terms
- Down payments and closing costs
- Credit requirements for home loans
- Property types and occupancy
- Real estate transactions
- Home buying and selling process
- Pre-approval and pre-qualification
- Mortgage insurance (PMI, MIP)
- Debt-to-income ratios
- Home appraisals and inspections
- Escrow and title
- First-time homebuyer programs
- Investment properties
- Real estate market conditions
- Housing affordability
- Mortgage documentation requirements

**STRICT RULES:**
1. If the question is NOT about mortgage or real estate, respond EXACTLY with: "I can only answer mortgage and real estate questions. Please ask about home loans, mortgages, buying/selling property, or real estate topics."
2. NEVER answer questions about: politics, general finance, stocks, crypto, cars, health, entertainment, sports, or ANY non-mortgage/real estate topic
3. NEVER engage in off-topic conversations, even if the user insists
4. NEVER provide legal or financial advice - always recommend consulting licensed professionals
5. Always mention NMLS #2459410 when discussing specific lending services
6. Include "Equal Housing Lender" disclaimer when appropriate
7. Be helpful and informative, but stay strictly within mortgage/real estate domain

**COMPLIANCE:**
- Never collect or request SSN, date of birth, or sensitive PII
- Always mention TCPA consent requirements for contact
- Recommend pre-approval as the next step when appropriate
- Direct users to licensed loan officers for specific loan quotes

Remember: You are a MORTGAGE AND REAL ESTATE SPECIALIST ONLY. No exceptions."#;

/// Pre-filter: does the question touch mortgage / real estate at all?
pub fn is_mortgage_related(question: &str) -> bool {
    let q = question.to_lowercase();

    if ALLOWED_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        return true;
    }

    // Compound heuristics
    (q.contains("buy") && (q.contains("property") || q.contains("home")))
        || (q.contains("sell") && (q.contains("property") || q.contains("home")))
        || (q.contains("finance") && q.contains("home"))
}

pub fn is_refusal(text: &str) -> bool {
    text.contains(REFUSAL_MARKER)
}

/// Context (indicator digest, general guidance) goes before the literal question
pub fn build_user_message(question: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!(
            "Context from our knowledge base and FRED economic data:\n{}\n\nUser Question: {}\n\nProvide a comprehensive answer using the context above, and add any additional relevant mortgage/real estate information that would be helpful.",
            context, question
        ),
        None => question.to_string(),
    }
}

/// HTTP deadline for the provider call. Shorter than the orchestrator's
/// deadline so a slow provider surfaces as [`TIMEOUT_MESSAGE`].
pub fn provider_timeout(fallback_timeout: Duration) -> Duration {
    fallback_timeout * 9 / 10
}

/// Generative fallback behind the topic guardrails
pub struct GuardedFallback {
    client: Option<Arc<dyn CompletionClient>>,
}

impl GuardedFallback {
    pub fn new(client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { client }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        match &config.openai_api_key {
            Some(key) => {
                let client = OpenAiClient::new(
                    key.clone(),
                    &config.openai_base_url,
                    &config.openai_model,
                    provider_timeout(config.fallback_timeout),
                )?;
                info!(model = %config.openai_model, "Generative fallback enabled");
                Ok(Self::new(Some(Arc::new(client))))
            }
            None => {
                warn!("OPENAI_API_KEY not configured - generative fallback disabled");
                Ok(Self::disabled())
            }
        }
    }

    pub fn available(&self) -> bool {
        self.client.is_some()
    }

    /// Ask a mortgage question.
    ///
    /// Off-topic questions return [`OFF_TOPIC_REFUSAL`] without calling the
    /// provider. Rate limits and provider timeouts become user-facing
    /// messages; every other failure is returned to the caller.
    pub async fn ask(&self, question: &str, context: Option<&str>) -> Result<String> {
        let client = self.client.as_ref().ok_or_else(|| {
            AdvisorError::NotConfigured(
                "Generative fallback not initialized. Set OPENAI_API_KEY.".to_string(),
            )
        })?;

        if !is_mortgage_related(question) {
            info!(question = %question, "Question rejected by topic pre-filter");
            return Ok(OFF_TOPIC_REFUSAL.to_string());
        }

        info!(provider = %client.name(), "Processing mortgage question with generative fallback");

        let request = CompletionRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            user: build_user_message(question, context),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
        };

        match client.complete(&request).await {
            Ok(answer) => {
                if is_refusal(&answer) {
                    warn!("Generated response indicates off-topic question");
                } else {
                    info!(chars = answer.len(), "Generated mortgage-focused answer");
                }
                Ok(answer)
            }
            Err(AdvisorError::RateLimited(detail)) => {
                warn!("Generative provider rate limited: {}", detail);
                Ok(HIGH_DEMAND_MESSAGE.to_string())
            }
            Err(AdvisorError::Timeout(detail)) => {
                warn!("Generative provider timed out: {}", detail);
                Ok(TIMEOUT_MESSAGE.to_string())
            }
            Err(e) => {
                error!("Generative fallback failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) enum Reply {
        Text(&'static str),
        RateLimited,
        Timeout,
        Broken,
        /// Answers with the text after the delay
        Slow(Duration, &'static str),
    }

    /// Counts calls and records the last request
    pub(crate) struct ScriptedClient {
        reply: Reply,
        pub(crate) calls: AtomicUsize,
        pub(crate) last_request: Mutex<Option<CompletionRequest>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::RateLimited => Err(AdvisorError::RateLimited("429".into())),
                Reply::Timeout => Err(AdvisorError::Timeout("504".into())),
                Reply::Broken => Err(AdvisorError::UpstreamUnavailable("500".into())),
                Reply::Slow(delay, text) => {
                    tokio::time::sleep(delay).await;
                    Ok(text.to_string())
                }
            }
        }
    }

    fn guarded(reply: Reply) -> (GuardedFallback, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient::new(reply));
        (GuardedFallback::new(Some(client.clone())), client)
    }

    #[tokio::test]
    async fn test_off_topic_refused_without_call() {
        let (fallback, client) = guarded(Reply::Text("should not be used"));

        let answer = fallback.ask("What's a good stock to buy?", None).await.unwrap();

        assert_eq!(answer, OFF_TOPIC_REFUSAL);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_fails_not_configured() {
        let err = GuardedFallback::disabled()
            .ask("How do FHA loans work?", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_context_precedes_question() {
        let (fallback, client) = guarded(Reply::Text("FHA loans allow 3.5% down. NMLS #2459410."));

        let answer = fallback
            .ask("How do FHA loans work?", Some("**Current Mortgage Rates (from FRED)**:"))
            .await
            .unwrap();
        assert!(answer.contains("FHA"));

        let request = client.last_request.lock().unwrap().clone().unwrap();
        let context_at = request.user.find("Current Mortgage Rates").unwrap();
        let question_at = request.user.find("How do FHA loans work?").unwrap();
        assert!(context_at < question_at);
        assert!(request.system.contains(OFF_TOPIC_REFUSAL));
        assert!(request.system.contains(LICENSE_ID));
        assert_eq!(request.max_tokens, 800);
    }

    #[tokio::test]
    async fn test_refusal_passes_through_verbatim() {
        let (fallback, _) = guarded(Reply::Text(OFF_TOPIC_REFUSAL));
        let answer = fallback.ask("Is this house haunted?", None).await.unwrap();
        assert_eq!(answer, OFF_TOPIC_REFUSAL);
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let (fallback, _) = guarded(Reply::RateLimited);
        assert_eq!(fallback.ask("mortgage help", None).await.unwrap(), HIGH_DEMAND_MESSAGE);

        let (fallback, _) = guarded(Reply::Timeout);
        assert_eq!(fallback.ask("mortgage help", None).await.unwrap(), TIMEOUT_MESSAGE);

        let (fallback, client) = guarded(Reply::Broken);
        assert!(fallback.ask("mortgage help", None).await.is_err());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_provider_deadline_is_inside_fallback_deadline() {
        let fallback = Duration::from_secs(10);
        assert_eq!(provider_timeout(fallback), Duration::from_secs(9));
        assert!(provider_timeout(Duration::from_millis(50)) < Duration::from_millis(50));
    }

    #[test]
    fn test_allow_list() {
        assert!(is_mortgage_related("Can I refinance my condo?"));
        assert!(is_mortgage_related("Should I sell my home this spring?"));
        assert!(!is_mortgage_related("Who won the game last night?"));
        assert!(!is_mortgage_related("Tell me a joke about penguins"));
    }

    #[test]
    fn test_user_message_without_context() {
        assert_eq!(build_user_message("What is escrow?", None), "What is escrow?");
        assert_eq!(build_user_message("What is escrow?", Some("  ")), "What is escrow?");
    }
}
