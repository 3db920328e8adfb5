//! Daily aggregation and AQI scoring.
//!
//! This module groups cleaned measurements into per-day, per-pollutant
//! means and scores each mean against the EPA breakpoint tables.

pub mod aggregate;
pub mod aqi;
pub mod types;
pub mod utility;
