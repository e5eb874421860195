//! FRED (Federal Reserve Economic Data) client
//!
//! Fetches the single most recent observation of a series.
//! Uses a long-lived reqwest::Client for connection pooling.

use super::ObservationSource;
use crate::error::AdvisorError;
use crate::Result;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

pub struct FredClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FredClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ObservationSource for FredClient {
    async fn latest(&self, series_id: &str) -> Result<(f64, NaiveDate)> {
        if self.api_key.is_empty() {
            return Err(AdvisorError::NotConfigured(
                "FRED_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/series/observations", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("limit", "1"),
                ("sort_order", "desc"),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(series = %series_id, "FRED request failed: {}", e);
                if e.is_timeout() {
                    AdvisorError::Timeout(format!("FRED {}: {}", series_id, e))
                } else {
                    AdvisorError::UpstreamUnavailable(format!("FRED {}: {}", series_id, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(series = %series_id, status = %status, "FRED API error response");
            return Err(AdvisorError::UpstreamUnavailable(format!(
                "FRED returned {} for {}",
                status, series_id
            )));
        }

        let body: ObservationsResponse = response.json().await.map_err(|e| {
            AdvisorError::UpstreamUnavailable(format!("FRED parse error for {}: {}", series_id, e))
        })?;

        let latest = parse_latest(&body).ok_or_else(|| {
            AdvisorError::UpstreamUnavailable(format!("No usable observation for {}", series_id))
        })?;

        debug!(series = %series_id, value = latest.0, date = %latest.1, "FRED observation");
        Ok(latest)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

/// First observation, if its value is numeric and its date parses.
/// FRED reports missing values as ".".
fn parse_latest(body: &ObservationsResponse) -> Option<(f64, NaiveDate)> {
    let observation = body.observations.first()?;
    let value: f64 = observation.value.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let date = NaiveDate::parse_from_str(observation.date.trim(), "%Y-%m-%d").ok()?;
    Some((value, date))
}
