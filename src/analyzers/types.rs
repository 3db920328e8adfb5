//! Data types used by the aggregation pipeline.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw measurement that survived normalization.
///
/// `parameter` is never empty and `date` is always the UTC calendar day of
/// `timestamp`. City, country and unit may still be missing; such rows are
/// skipped when grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedMeasurement {
    pub city: Option<String>,
    pub country: Option<String>,
    pub parameter: String,
    pub value: f64,
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
}

impl CleanedMeasurement {
    pub fn new(parameter: &str, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            city: None,
            country: None,
            parameter: parameter.to_string(),
            value,
            unit: None,
            timestamp,
            date: timestamp.date_naive(),
        }
    }

    /// Set location metadata (city and country).
    pub fn with_location(mut self, city: &str, country: &str) -> Self {
        self.city = Some(city.to_string());
        self.country = Some(country.to_string());
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }
}

/// Mean concentration of one pollutant for one city and UTC day.
///
/// Field order is the column order of the persisted CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub city: String,
    pub country: String,
    pub parameter: String,
    pub unit: String,
    pub date: NaiveDate,
    pub value: f64,
    pub aqi: Option<f64>,
}

impl DailyAggregate {
    /// Turns the aggregate back into a single measurement at midnight UTC,
    /// so persisted daily files can be fed through aggregation again.
    pub fn to_measurement(&self) -> CleanedMeasurement {
        let timestamp = self.date.and_time(NaiveTime::MIN).and_utc();
        CleanedMeasurement::new(&self.parameter, self.value, timestamp)
            .with_location(&self.city, &self.country)
            .with_unit(&self.unit)
    }
}
