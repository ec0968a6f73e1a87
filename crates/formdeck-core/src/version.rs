//! Version number allocation.
//!
//! Versions are display tags riding on a monotonically non-decreasing
//! watermark: new versions take the next whole number, duplicates take the
//! next one-decimal step. The watermark itself lives in the cache and is
//! advanced only after the remote store accepted the new document, so a
//! failed create never burns a number.

use crate::error::{DeckError, Result};

/// The version for a brand-new Form: the next whole number past the
/// watermark.
pub fn next_new_version(watermark: f64) -> f64 {
    watermark.floor() + 1.0
}

/// The version for a duplicated Form: the watermark plus one decimal step.
///
/// Rounding to one decimal can, at representability edges, produce a value
/// that fails to advance past the watermark. One recompute is allowed; a
/// tie that survives it is an allocation failure rather than a loop.
pub fn next_duplicate_version(watermark: f64) -> Result<f64> {
    for _ in 0..2 {
        let candidate = round_one_decimal(watermark + 0.1);
        if candidate > watermark {
            return Ok(candidate);
        }
    }
    Err(DeckError::VersionAllocation(format!(
        "candidate did not advance past watermark {watermark}"
    )))
}

/// Renders a version for display and default names: whole numbers without
/// the fractional part ("4"), duplicates with one decimal ("4.1").
pub fn format_version(version: f64) -> String {
    if version.fract() == 0.0 {
        format!("{}", version as i64)
    } else {
        format!("{version:.1}")
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
