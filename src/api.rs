//! HTTP tool server for the mortgage advisor
//!
//! Exposes the advisor, calculator, intake/lead capture and the widget
//! resource over HTTP. Every tool replies inside the `ApiResponse`
//! envelope with a text `content` block and machine-readable
//! `structuredContent`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::advisor::MortgageAdvisor;
use crate::calculator::{self, PaymentRequest};
use crate::error::AdvisorError;
use crate::leads::{self, LeadNotifier, LeadStore};
use crate::models::{IntakeForm, LeadSubmission};
use crate::widget::{WidgetResource, WIDGET_MIME_TYPE, WIDGET_URI};

pub const PREQUAL_LABEL: &str = "Continue / Create Account";
const MIN_QUESTION_CHARS: usize = 4;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct AdvisorRequest {
    pub question: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// What a tool hands back: display text plus structured payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    pub structured_content: Value,
}

impl ToolResult {
    fn new(text: impl Into<String>, structured_content: Value) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: "text",
                text: text.into(),
            }],
            structured_content,
        }
    }
}

type ToolReply = (StatusCode, Json<ApiResponse>);

fn ok(result: ToolResult) -> ToolReply {
    (StatusCode::OK, Json(ApiResponse::success(result)))
}

fn fail(error: AdvisorError) -> ToolReply {
    let status = match error {
        AdvisorError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Tool call failed: {}", error);
    }
    (status, Json(ApiResponse::error(error.to_string())))
}

fn rejected(rejection: JsonRejection) -> ToolReply {
    fail(AdvisorError::MalformedInput(rejection.body_text()))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub advisor: Arc<MortgageAdvisor>,
    pub leads: Arc<dyn LeadStore>,
    pub notifier: Arc<dyn LeadNotifier>,
    pub widget: Arc<WidgetResource>,
    pub prequal_url: String,
}

/// =============================
/// Tool Catalogue
/// =============================

struct ToolDescriptor {
    name: &'static str,
    title: &'static str,
    description: &'static str,
    invoking: &'static str,
    invoked: &'static str,
}

const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "mortgageAdvisor",
        title: "Mortgage knowledge advisor",
        description: "Answers mortgage questions from live economic data, curated guidance, and a mortgage-only assistant.",
        invoking: "Reviewing knowledge base",
        invoked: "Shared guidance",
    },
    ToolDescriptor {
        name: "mortgageCalculator",
        title: "Mortgage payment calculator",
        description: "Estimates monthly payment, interest, and payoff timeline.",
        invoking: "Crunching numbers",
        invoked: "Shared payment estimate",
    },
    ToolDescriptor {
        name: "submitLead",
        title: "Capture lead",
        description: "Stores a marketing lead with explicit consent.",
        invoking: "Collecting lead",
        invoked: "Lead collected",
    },
    ToolDescriptor {
        name: "saveIntake",
        title: "Save mortgage intake",
        description: "Persists the borrower's program preferences before the secure handoff.",
        invoking: "Saving intake",
        invoked: "Intake saved",
    },
    ToolDescriptor {
        name: "startPrequalSession",
        title: "Start prequalification",
        description: "Returns the secure application portal URL with attribution parameters.",
        invoking: "Preparing handoff",
        invoked: "Handoff ready",
    },
];

async fn list_tools() -> Json<Value> {
    let tools: Vec<Value> = TOOLS
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "title": tool.title,
                "description": tool.description,
                "_meta": {
                    "openai/outputTemplate": WIDGET_URI,
                    "openai/toolInvocation/invoking": tool.invoking,
                    "openai/toolInvocation/invoked": tool.invoked,
                    "openai/widgetAccessible": true
                }
            })
        })
        .collect();

    Json(json!({ "tools": tools }))
}

/// =============================
/// Health Endpoints
/// =============================

async fn banner() -> &'static str {
    "MortgageBroker advisor server"
}

async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "leadStore": state.leads.backend(),
        "notifier": state.notifier.name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Tool Endpoints
/// =============================

async fn mortgage_advisor(
    State(state): State<ApiState>,
    payload: Result<Json<AdvisorRequest>, JsonRejection>,
) -> ToolReply {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return rejected(rejection),
    };

    // length counts the raw text, surrounding whitespace included
    if req.question.chars().count() < MIN_QUESTION_CHARS {
        return fail(AdvisorError::MalformedInput(
            "Ask a full question so I can help".to_string(),
        ));
    }

    let outcome = state.advisor.respond(req.question.trim()).await;
    info!(stage = %outcome.stage, category = %outcome.analysis.category, "mortgageAdvisor answered");

    ok(ToolResult::new(
        outcome.answer.summary.clone(),
        json!({
            "step": "advisor",
            "answer": outcome.answer,
        }),
    ))
}

async fn mortgage_calculator(payload: Result<Json<PaymentRequest>, JsonRejection>) -> ToolReply {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return rejected(rejection),
    };

    match calculator::calculate_payment(&req) {
        Ok(estimate) => ok(ToolResult::new(
            calculator::describe(&req, &estimate),
            json!({
                "step": "advisor",
                "calculator": estimate,
            }),
        )),
        Err(e) => fail(e),
    }
}

async fn save_intake(
    State(state): State<ApiState>,
    payload: Result<Json<IntakeForm>, JsonRejection>,
) -> ToolReply {
    let Json(form) = match payload {
        Ok(form) => form,
        Err(rejection) => return rejected(rejection),
    };

    if let Err(e) = leads::validate_intake(&form) {
        return fail(e);
    }

    match state.leads.save_intake(&form).await {
        Ok(record) => {
            info!(intake_id = %record.intake_id, purpose = %form.purpose.as_str(), "Intake saved");
            ok(ToolResult::new(
                "Intake saved; ready for secure handoff.",
                json!({ "step": "handoff", "intakeId": record.intake_id }),
            ))
        }
        Err(e) => fail(e),
    }
}

async fn submit_lead(
    State(state): State<ApiState>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> ToolReply {
    let Json(submission) = match payload {
        Ok(submission) => submission,
        Err(rejection) => return rejected(rejection),
    };

    if let Err(e) = leads::validate_lead(&submission) {
        return fail(e);
    }

    let lead = match state.leads.save_lead(&submission).await {
        Ok(lead) => lead,
        Err(e) => return fail(e),
    };

    if let Some(intake) = &submission.intake {
        if let Err(e) = state.leads.save_intake(intake).await {
            return fail(e);
        }
    }

    info!(
        lead_id = %lead.lead_id,
        email_fp = %leads::fingerprint(&lead.email),
        has_intake = submission.intake.is_some(),
        "Lead saved"
    );

    if let Err(e) = state
        .notifier
        .notify(&lead, submission.intake.as_ref())
        .await
    {
        warn!(lead_id = %lead.lead_id, notifier = %state.notifier.name(), "Lead notification failed: {}", e);
    }

    ok(ToolResult::new(
        format!("Lead saved for {}.", lead.full_name),
        json!({ "step": "handoff", "leadId": lead.lead_id }),
    ))
}

async fn start_prequal_session(State(state): State<ApiState>) -> ToolReply {
    ok(ToolResult::new(
        "Launching secure application portal.",
        json!({
            "url": state.prequal_url,
            "label": PREQUAL_LABEL,
        }),
    ))
}

/// =============================
/// Widget Resource
/// =============================

async fn widget_html(State(state): State<ApiState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, WIDGET_MIME_TYPE)],
        state.widget.html().to_string(),
    )
}

async fn widget_meta(State(state): State<ApiState>) -> Json<Value> {
    Json(state.widget.metadata())
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/mortgageAdvisor", post(mortgage_advisor))
        .route("/tools/mortgageCalculator", post(mortgage_calculator))
        .route("/tools/saveIntake", post(save_intake))
        .route("/tools/submitLead", post(submit_lead))
        .route("/tools/startPrequalSession", post(start_prequal_session))
        .route("/widget", get(widget_html))
        .route("/widget/meta", get(widget_meta))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    bind_address: &str,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    info!("Advisor tool server listening on http://{}", bind_address);

    axum::serve(listener, router).await?;

    Ok(())
}
