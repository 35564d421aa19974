//! Per-condition pass rates over a condition matrix.
//!
//! For each named condition: how often it passes, and how often a signal
//! fires on the bars where it passes. Feeds the rule-suggestion prompt.

use serde::{Deserialize, Serialize};

use super::detector::ConditionRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDiagnostic {
    pub condition: String,
    /// Fraction of evaluated bars on which the condition held.
    pub pass_rate: f64,
    /// Fraction of passing bars that also produced a non-None signal.
    pub signal_rate_given_pass: f64,
}

/// Summarise a condition matrix. Rows that are `None` (warmup) are skipped;
/// an empty matrix yields an empty table.
pub fn condition_diagnostics(matrix: &[Option<ConditionRow>]) -> Vec<ConditionDiagnostic> {
    let rows: Vec<&ConditionRow> = matrix.iter().flatten().collect();
    if rows.is_empty() {
        return Vec::new();
    }

    ConditionRow::NAMES
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let mut passed = 0usize;
            let mut signalled = 0usize;
            for row in &rows {
                if row.values()[col] {
                    passed += 1;
                    if row.signal().is_some() {
                        signalled += 1;
                    }
                }
            }
            ConditionDiagnostic {
                condition: (*name).to_string(),
                pass_rate: passed as f64 / rows.len() as f64,
                signal_rate_given_pass: if passed > 0 {
                    signalled as f64 / passed as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}
