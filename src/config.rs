//! Runtime settings read from the environment.
//!
//! `main` loads a `.env` file through `dotenvy` first, so every variable below
//! can live there as well.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.openaq.org/v2";
pub const DEFAULT_PARAMETERS: &[&str] = &["pm25", "no2", "o3", "co"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `OPENAQ_BASE_URL`
    pub base_url: String,
    /// `OPENAQ_API_KEY`, sent as `X-API-Key` when present.
    pub api_key: Option<String>,
    /// `OPENAQ_PARAMETERS`, comma separated.
    pub parameters: Vec<String>,
    /// `OPENAQ_TIMEOUT_SECS`
    pub timeout: Duration,
    /// `RAW_DIR`
    pub raw_dir: PathBuf,
    /// `PROCESSED_DIR`
    pub processed_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            parameters: DEFAULT_PARAMETERS.iter().map(|p| p.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
        }
    }
}

impl Settings {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Unset or blank
    /// variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        if let Some(url) = get("OPENAQ_BASE_URL") {
            settings.base_url = url.trim_end_matches('/').to_string();
        }
        settings.api_key = get("OPENAQ_API_KEY");

        if let Some(list) = get("OPENAQ_PARAMETERS") {
            let parameters: Vec<String> = list
                .split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
            if !parameters.is_empty() {
                settings.parameters = parameters;
            }
        }

        if let Some(raw) = get("OPENAQ_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(0) => warn!(value = %raw, "OPENAQ_TIMEOUT_SECS must be positive, using default"),
                Ok(secs) => settings.timeout = Duration::from_secs(secs),
                Err(e) => warn!(value = %raw, error = %e, "Invalid OPENAQ_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(dir) = get("RAW_DIR") {
            settings.raw_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("PROCESSED_DIR") {
            settings.processed_dir = PathBuf::from(dir);
        }

        settings
    }
}
