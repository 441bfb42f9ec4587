use serde::Serialize;
use std::fmt;

use crate::snapshot::FinalScore;

/// Outcome of comparing the computed total with the entered final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Consistent,
    Mismatch,
    Unset,
    Disqualified,
}

impl ReconciliationStatus {
    pub fn is_mismatch(self) -> bool {
        self == ReconciliationStatus::Mismatch
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconciliationStatus::Consistent => "ok",
            ReconciliationStatus::Mismatch => "MISMATCH",
            ReconciliationStatus::Unset => "unset",
            ReconciliationStatus::Disqualified => "DSQ/DNF",
        };
        f.write_str(s)
    }
}

/// Compare a computed total (whole points) with the final score (tenths).
///
/// A final score with a fractional part never matches a whole-point total.
pub fn reconcile(computed_total: i64, final_score: FinalScore) -> ReconciliationStatus {
    match final_score {
        FinalScore::Unset => ReconciliationStatus::Unset,
        FinalScore::Disqualified => ReconciliationStatus::Disqualified,
        FinalScore::Tenths(tenths) => {
            if computed_total.checked_mul(10) == Some(tenths) {
                ReconciliationStatus::Consistent
            } else {
                ReconciliationStatus::Mismatch
            }
        }
    }
}
