//! Error type for the file-based entry points of the pipeline.
//!
//! Row-level problems (missing fields, bad timestamps, unsupported pollutants)
//! are never errors; they are dropped or reported as a missing AQI. Only
//! structural failures of a raw source end up here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The named raw data source does not exist.
    #[error("raw data file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to decode JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
