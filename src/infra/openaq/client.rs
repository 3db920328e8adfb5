use air_quality_pipeline::fetch::{HttpClient, fetch_bytes};
use air_quality_pipeline::parser::{RawTable, parse_json_results};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::{info, warn};

use crate::services::measurements_api::{MeasurementQuery, MeasurementsApi};

/// Client for the OpenAQ `/measurements` endpoint.
pub struct OpenAqClient<C> {
    http: C,
    base_url: String,
}

impl<C> OpenAqClient<C> {
    pub fn new(http: C, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the request URL, newest records first, one `parameter` pair
    /// per requested pollutant.
    pub fn measurements_url(&self, query: &MeasurementQuery) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/measurements", self.base_url))
            .with_context(|| format!("invalid OpenAQ base URL '{}'", self.base_url))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("city", &query.city)
                .append_pair("date_from", &query.date_from.to_rfc3339())
                .append_pair("date_to", &query.date_to.to_rfc3339())
                .append_pair("limit", &query.limit.to_string())
                .append_pair("sort", "desc");
            for parameter in &query.parameters {
                pairs.append_pair("parameter", parameter);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> MeasurementsApi for OpenAqClient<C> {
    #[tracing::instrument(skip(self), fields(city = %query.city))]
    async fn fetch_measurements(&self, query: &MeasurementQuery) -> Result<RawTable> {
        let url = self.measurements_url(query)?;

        let bytes = fetch_bytes(&self.http, url.as_str())
            .await
            .with_context(|| format!("OpenAQ request failed for '{}'", query.city))?;
        let table = parse_json_results(&bytes).context("Failed to parse OpenAQ response")?;

        if table.is_empty() {
            warn!("No air quality data found");
        } else {
            info!(records = table.len(), "Retrieved measurements");
        }

        Ok(table)
    }
}
