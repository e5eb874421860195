//! Process configuration
//!
//! Everything is read from the environment (binaries load `.env` first).
//! Missing credentials are not errors: they switch the matching capability off.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_PREQUAL_URL: &str = "https://apply.newamericanfunding.com/apply/nikola-spadijer/account?utm_source=mortgagebroker_app&utm_medium=chatgpt&utm_campaign=prequal_flow";
pub const DEFAULT_LEAD_EMAIL_TO: &str = "nikola.spadijer@nafinc.com";

const DEFAULT_INDICATOR_TIMEOUT_MS: u64 = 4_000;
const DEFAULT_FALLBACK_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PORT: u16 = 2091;

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub fred_api_key: Option<String>,
    pub fred_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Per-series budget; the series of one bundle are fetched concurrently.
    pub indicator_timeout: Duration,
    pub fallback_timeout: Duration,
    /// Trusted behavior mode: never reach the generative fallback.
    pub curated_only: bool,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_from: Option<String>,
    pub lead_email_to: String,
    pub widget_dir: PathBuf,
    pub prequal_url: String,
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map instead of the process env).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| lookup(key).and_then(non_placeholder);
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let sendgrid_api_key = secret("SENDGRID_API_KEY").or_else(|| secret("SMTP_PASS"));
        let sendgrid_from = secret("SENDGRID_FROM").or_else(|| secret("SMTP_USER"));

        Self {
            fred_api_key: secret("FRED_API_KEY"),
            fred_base_url: text("FRED_BASE_URL", DEFAULT_FRED_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            openai_api_key: secret("OPENAI_API_KEY"),
            openai_base_url: text("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            openai_model: text("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            indicator_timeout: Duration::from_millis(parse_or(
                "INDICATOR_TIMEOUT_MS",
                lookup("INDICATOR_TIMEOUT_MS"),
                DEFAULT_INDICATOR_TIMEOUT_MS,
            )),
            fallback_timeout: Duration::from_millis(parse_or(
                "FALLBACK_TIMEOUT_MS",
                lookup("FALLBACK_TIMEOUT_MS"),
                DEFAULT_FALLBACK_TIMEOUT_MS,
            )),
            curated_only: lookup("ADVISOR_CURATED_ONLY")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            host: text("HOST", "127.0.0.1"),
            port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT),
            database_url: secret("POSTGRES_URL").or_else(|| secret("DATABASE_URL")),
            sendgrid_api_key,
            sendgrid_from,
            lead_email_to: text("LEAD_EMAIL_TO", DEFAULT_LEAD_EMAIL_TO),
            widget_dir: PathBuf::from(text("WIDGET_DIR", "dist/widget")),
            prequal_url: text("PREQUAL_URL", DEFAULT_PREQUAL_URL),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Treat empty strings and `.env.example` placeholders as unset.
fn non_placeholder(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || (trimmed.starts_with("your_") && trimmed.ends_with("_here")) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value.trim().parse().unwrap_or_else(|_| {
            warn!(key = key, value = %value, "Unparseable configuration value, using default");
            default
        }),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AdvisorConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AdvisorConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AdvisorConfig::default();
        assert!(config.fred_api_key.is_none());
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.fallback_timeout, Duration::from_secs(10));
        assert_eq!(config.bind_address(), "127.0.0.1:2091");
        assert!(!config.curated_only);
    }

    #[test]
    fn test_placeholder_keys_count_as_missing() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "your_openai_api_key_here"),
            ("FRED_API_KEY", "   "),
        ]);
        assert!(config.openai_api_key.is_none());
        assert!(config.fred_api_key.is_none());
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = config_from(&[
            ("FRED_API_KEY", "abc123"),
            ("FRED_BASE_URL", "http://localhost:9000/fred/"),
            ("PORT", "not-a-port"),
            ("FALLBACK_TIMEOUT_MS", "2500"),
            ("ADVISOR_CURATED_ONLY", "yes"),
        ]);
        assert_eq!(config.fred_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.fred_base_url, "http://localhost:9000/fred");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.fallback_timeout, Duration::from_millis(2500));
        assert!(config.curated_only);
    }

    #[test]
    fn test_sendgrid_falls_back_to_smtp_keys() {
        let config = config_from(&[("SMTP_PASS", "sg-key"), ("SMTP_USER", "from@example.com")]);
        assert_eq!(config.sendgrid_api_key.as_deref(), Some("sg-key"));
        assert_eq!(config.sendgrid_from.as_deref(), Some("from@example.com"));
    }
}
