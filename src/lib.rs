//! Mortgage Advisor
//!
//! Answers free-text mortgage questions for a brokerage assistant:
//! - Live economic indicators (FRED) take priority when relevant
//! - Curated per-topic guidance from a static knowledge table
//! - A guarded, mortgage-only generative fallback for general questions
//! - Generic guidance that always answers
//!
//! PRIORITY CHAIN:
//! INDICATORS → CURATED → GENERATIVE → GENERIC GUIDANCE
//!
//! Around the advisor sits a small HTTP tool server: payment calculator,
//! intake and lead capture, application handoff and the widget resource.

pub mod advisor;
pub mod api;
pub mod calculator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod guardrails;
pub mod indicators;
pub mod knowledge;
pub mod leads;
pub mod llm;
pub mod models;
pub mod widget;

pub use error::{AdvisorError, Result};

// Re-export common types
pub use advisor::{AdvisorOutcome, MortgageAdvisor, Stage};
pub use classifier::{analyze, QuestionClassifier};
pub use config::AdvisorConfig;
pub use models::*;
