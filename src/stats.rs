use serde::Serialize;

/// Row counts collected while normalizing a raw table.
///
/// Purely diagnostic: the counts never change what the pipeline emits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub input_rows: usize,

    // rows removed, by reason
    pub duplicate_rows: usize,
    pub missing_fields: usize,
    pub invalid_values: usize,
    pub invalid_timestamps: usize,

    pub cleaned_rows: usize,
}

impl CleanStats {
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn dropped_rows(&self) -> usize {
        self.duplicate_rows + self.missing_fields + self.invalid_values + self.invalid_timestamps
    }

    pub fn dropped_pct(&self) -> f64 {
        Self::pct(self.dropped_rows(), self.input_rows)
    }
}
