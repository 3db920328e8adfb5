//! Trait and types for pulling raw measurements from an air-quality API.

use air_quality_pipeline::parser::RawTable;
use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};

/// Which measurements to request: one city, a UTC time window, a set of
/// pollutants and an upper bound on returned records.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementQuery {
    pub city: String,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub limit: usize,
    pub parameters: Vec<String>,
}

impl MeasurementQuery {
    /// The `days` days ending now.
    pub fn last_days(city: &str, days: u32, limit: usize, parameters: &[String]) -> Self {
        let date_to = Utc::now();
        Self {
            city: city.to_string(),
            date_from: date_to - TimeDelta::days(i64::from(days)),
            date_to,
            limit,
            parameters: parameters.to_vec(),
        }
    }
}

/// Abstraction over a measurements provider (e.g., OpenAQ).
#[async_trait::async_trait]
pub trait MeasurementsApi: Send + Sync {
    /// Returns the raw measurements matching `query`. No matches is an empty
    /// table, not an error.
    async fn fetch_measurements(&self, query: &MeasurementQuery) -> Result<RawTable>;
}
