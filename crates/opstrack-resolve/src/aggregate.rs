//! Result aggregation: total hours and advisory warnings.

use crate::types::{ParseResult, ResolvedEntry};

/// Daily totals above this are almost certainly wrong.
pub const IMPOSSIBLE_DAY_HOURS: f64 = 24.0;
/// Daily totals above this are flagged as overtime.
pub const LONG_DAY_HOURS: f64 = 12.0;
/// Entries below this confidence are counted in a review warning.
pub const LOW_CONFIDENCE: f64 = 0.5;

/// Assemble the final result.
///
/// `warnings` are emitted first (model and per-entry warnings), followed by
/// the hour and confidence checks.
pub fn aggregate(entries: Vec<ResolvedEntry>, mut warnings: Vec<String>) -> ParseResult {
    let total_hours: f64 = entries.iter().map(|e| e.hours).sum();

    if total_hours > IMPOSSIBLE_DAY_HOURS {
        warnings.push(format!(
            "Total hours ({}h) exceeds 24 hours for a single day",
            total_hours
        ));
    } else if total_hours > LONG_DAY_HOURS {
        warnings.push(format!("Total hours ({}h) exceeds 12 hours", total_hours));
    }

    let low_confidence = entries.iter().filter(|e| e.confidence < LOW_CONFIDENCE).count();
    if low_confidence > 0 {
        warnings.push(format!(
            "{} entr{} with low confidence (< {}); please review",
            low_confidence,
            if low_confidence == 1 { "y" } else { "ies" },
            LOW_CONFIDENCE
        ));
    }

    ParseResult {
        entries,
        total_hours,
        warnings,
    }
}
