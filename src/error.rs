//! Error types for the mortgage advisor

use thiserror::Error;

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {

    // =============================
    // Answer Pipeline Errors
    // =============================

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    // =============================
    // Tool Boundary Errors
    // =============================

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AdvisorError {
    /// Failures the answer pipeline treats as "this source had nothing".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AdvisorError::UpstreamUnavailable(_)
                | AdvisorError::NotConfigured(_)
                | AdvisorError::Timeout(_)
                | AdvisorError::RateLimited(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_variants() {
        assert!(AdvisorError::NotConfigured("OPENAI_API_KEY".into()).is_recoverable());
        assert!(AdvisorError::Timeout("fred".into()).is_recoverable());
        assert!(!AdvisorError::MalformedInput("question".into()).is_recoverable());
        assert!(!AdvisorError::Storage("insert".into()).is_recoverable());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = AdvisorError::UpstreamUnavailable("FRED returned 500".into());
        assert_eq!(err.to_string(), "Upstream unavailable: FRED returned 500");
    }
}
