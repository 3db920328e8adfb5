//! Normalize-then-aggregate in one call.

use std::path::Path;

use crate::analyzers::aggregate::aggregate_daily;
use crate::analyzers::types::DailyAggregate;
use crate::error::Result;
use crate::normalize::{NormalizedBatch, clean_file, clean_table};
use crate::parser::RawTable;
use crate::stats::CleanStats;

/// Daily aggregates plus the normalizer's row counts.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub aggregates: Vec<DailyAggregate>,
    pub stats: CleanStats,
}

impl From<NormalizedBatch> for PipelineOutput {
    fn from(batch: NormalizedBatch) -> Self {
        Self {
            aggregates: aggregate_daily(&batch.measurements),
            stats: batch.stats,
        }
    }
}

/// Runs a raw table through the normalizer and the daily aggregator.
pub fn process_table(table: &RawTable) -> PipelineOutput {
    clean_table(table).into()
}

/// Same as [`process_table`] for a raw CSV on disk.
///
/// # Errors
///
/// Propagates [`crate::error::PipelineError::InputNotFound`] unchanged when
/// `path` does not exist.
pub fn process_file(path: impl AsRef<Path>) -> Result<PipelineOutput> {
    Ok(clean_file(path)?.into())
}
