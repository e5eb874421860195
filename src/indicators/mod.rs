//! Economic Indicator Lookup
//!
//! Routes a question to one of three coarse intents, fetches the latest
//! value of that intent's series concurrently, and renders the readings
//! that came back as a human-readable digest.
//!
//! Each series fails independently. Only an all-empty bundle counts as
//! "no indicator data".

use crate::config::AdvisorConfig;
use crate::models::Indicator;
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod fred;
pub use fred::FredClient;

/// Anything that can report the most recent observation of a named series
#[async_trait::async_trait]
pub trait ObservationSource: Send + Sync {
    async fn latest(&self, series_id: &str) -> Result<(f64, NaiveDate)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorIntent {
    MortgageRates,
    HousingMarket,
    EconomicIndicators,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Percent,
    Dollars,
    Units,
    Count,
    /// Index level, one decimal
    Index,
    /// Billions in, trillions out
    Trillions,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SeriesSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub format: ValueFormat,
}

const RATE_SERIES: [SeriesSpec; 3] = [
    SeriesSpec { id: "MORTGAGE30US", label: "30-Year Fixed", format: ValueFormat::Percent },
    SeriesSpec { id: "MORTGAGE15US", label: "15-Year Fixed", format: ValueFormat::Percent },
    SeriesSpec { id: "FEDFUNDS", label: "Federal Funds Rate", format: ValueFormat::Percent },
];

const HOUSING_SERIES: [SeriesSpec; 3] = [
    SeriesSpec { id: "MSPUS", label: "Median Home Price", format: ValueFormat::Dollars },
    SeriesSpec { id: "HOUST", label: "Housing Starts", format: ValueFormat::Units },
    SeriesSpec { id: "EXHOSLUSM495S", label: "Existing Home Sales", format: ValueFormat::Count },
];

const ECONOMY_SERIES: [SeriesSpec; 3] = [
    SeriesSpec { id: "CPIAUCSL", label: "CPI (Inflation)", format: ValueFormat::Index },
    SeriesSpec { id: "UNRATE", label: "Unemployment Rate", format: ValueFormat::Percent },
    SeriesSpec { id: "GDP", label: "GDP", format: ValueFormat::Trillions },
];

const RATE_TRIGGERS: &[&str] = &["mortgage rate", "interest rate", "current rate"];
const HOUSING_TRIGGERS: &[&str] = &["home price", "housing market", "housing start"];
const ECONOMY_TRIGGERS: &[&str] = &["inflation", "cpi", "economy", "unemployment"];

impl IndicatorIntent {
    /// Substring routing, checked rates → housing → economy
    pub fn detect(question: &str) -> Option<Self> {
        let q = question.to_lowercase();
        let has_any = |triggers: &[&str]| triggers.iter().any(|t| q.contains(t));

        if has_any(RATE_TRIGGERS) {
            Some(IndicatorIntent::MortgageRates)
        } else if has_any(HOUSING_TRIGGERS) {
            Some(IndicatorIntent::HousingMarket)
        } else if has_any(ECONOMY_TRIGGERS) {
            Some(IndicatorIntent::EconomicIndicators)
        } else {
            None
        }
    }

    pub fn series(&self) -> &'static [SeriesSpec; 3] {
        match self {
            IndicatorIntent::MortgageRates => &RATE_SERIES,
            IndicatorIntent::HousingMarket => &HOUSING_SERIES,
            IndicatorIntent::EconomicIndicators => &ECONOMY_SERIES,
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            IndicatorIntent::MortgageRates => "**Current Mortgage Rates (from FRED)**:",
            IndicatorIntent::HousingMarket => "**Housing Market Data (from FRED)**:",
            IndicatorIntent::EconomicIndicators => "**Economic Indicators (from FRED)**:",
        }
    }
}

/// Readings for one intent. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBundle {
    pub intent: IndicatorIntent,
    readings: Vec<(&'static SeriesSpec, Indicator)>,
}

impl IndicatorBundle {
    /// `None` when nothing came back
    pub fn from_readings(
        intent: IndicatorIntent,
        readings: Vec<(&'static SeriesSpec, Indicator)>,
    ) -> Option<Self> {
        if readings.is_empty() {
            None
        } else {
            Some(Self { intent, readings })
        }
    }

    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> {
        self.readings.iter().map(|(_, indicator)| indicator)
    }

    /// Heading plus one bullet per available metric
    pub fn digest(&self) -> String {
        let mut out = String::new();
        out.push_str(self.intent.heading());
        out.push_str("\n\n");

        for (spec, indicator) in &self.readings {
            out.push_str(&format!(
                "• **{}**: {} (as of {})\n",
                spec.label,
                format_value(indicator.value, spec.format),
                indicator.observed_on.format("%Y-%m-%d"),
            ));
        }

        out
    }
}

/// Indicator lookup over an optional observation source
pub struct IndicatorLookup {
    source: Option<Arc<dyn ObservationSource>>,
    timeout: Duration,
}

impl IndicatorLookup {
    pub fn new(source: Option<Arc<dyn ObservationSource>>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Lookup that always reports "no indicator data"
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(4))
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let source: Option<Arc<dyn ObservationSource>> = match &config.fred_api_key {
            Some(key) => {
                info!("FRED indicator source enabled");
                Some(Arc::new(FredClient::new(key.clone(), &config.fred_base_url)?))
            }
            None => {
                warn!("FRED_API_KEY not configured - indicator lookup disabled");
                None
            }
        };

        Ok(Self::new(source, config.indicator_timeout))
    }

    pub fn available(&self) -> bool {
        self.source.is_some()
    }

    /// Latest readings relevant to the question, or `None`.
    ///
    /// Unmatched questions return before any network call. The three series
    /// are fetched concurrently, each under the configured timeout.
    pub async fn lookup(&self, question: &str) -> Option<IndicatorBundle> {
        let intent = IndicatorIntent::detect(question)?;

        let Some(source) = self.source.as_ref() else {
            debug!(intent = ?intent, "Indicator intent matched but no source configured");
            return None;
        };

        let [first, second, third] = intent.series();
        let (a, b, c) = tokio::join!(
            self.fetch(&**source, first),
            self.fetch(&**source, second),
            self.fetch(&**source, third),
        );

        let readings: Vec<_> = [a, b, c].into_iter().flatten().collect();
        debug!(intent = ?intent, available = readings.len(), "Indicator bundle assembled");

        IndicatorBundle::from_readings(intent, readings)
    }

    async fn fetch(
        &self,
        source: &dyn ObservationSource,
        spec: &'static SeriesSpec,
    ) -> Option<(&'static SeriesSpec, Indicator)> {
        match tokio::time::timeout(self.timeout, source.latest(spec.id)).await {
            Ok(Ok((value, observed_on))) => Some((
                spec,
                Indicator {
                    value,
                    observed_on,
                    series_label: spec.label.to_string(),
                },
            )),
            Ok(Err(e)) => {
                warn!(series = %spec.id, "Indicator fetch failed: {}", e);
                None
            }
            Err(_) => {
                warn!(series = %spec.id, timeout_ms = self.timeout.as_millis() as u64, "Indicator fetch timed out");
                None
            }
        }
    }
}

fn format_value(value: f64, format: ValueFormat) -> String {
    match format {
        ValueFormat::Percent => format!("{}%", value),
        ValueFormat::Dollars => format!("${}", group_thousands(value)),
        ValueFormat::Units => format!("{} units", group_thousands(value)),
        ValueFormat::Count => group_thousands(value),
        ValueFormat::Index => format!("{:.1}", value),
        ValueFormat::Trillions => format!("${:.2}T", value / 1000.0),
    }
}

/// Rounds to a whole number and inserts thousands separators
fn group_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if rounded < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
