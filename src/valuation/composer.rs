//! Combines base value, adjustments and confidence into the final result,
//! then validates its own output. A failed invariant here is a bug in the
//! upstream math and is raised as a descriptive error, never papered over
//! with a default.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::core::error::ValuationError;
use crate::core::types::{
    AdjustmentEntry, ConfidenceBreakdown, QualityListing, StrategyOutcome, ValuationResult,
};

/// Baseline ± band around the final value. Callers widen this to 0.15 when
/// a lower-fidelity strategy produced the base value; that widening is the
/// caller's policy decision, not the composer's.
pub const DEFAULT_RANGE_BAND: f64 = 0.10;
pub const FALLBACK_RANGE_BAND: f64 = 0.15;

/// Adjusted value never drops below this fraction of the market base value,
/// however catastrophic the title/mileage combination.
fn value_floor_fraction() -> Decimal {
    Decimal::new(3, 1) // 0.3
}

#[derive(Default)]
pub struct ValuationComposer;

impl ValuationComposer {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn compose(
        &self,
        base_value: Decimal,
        adjustments: Vec<AdjustmentEntry>,
        confidence_score: u8,
        confidence_breakdown: ConfidenceBreakdown,
        market_listings: Vec<QualityListing>,
        sources_used: Vec<String>,
        range_band: f64,
        outcome: StrategyOutcome,
    ) -> Result<ValuationResult, ValuationError> {
        let total_adjustment: Decimal = adjustments.iter().map(|a| a.impact).sum();
        let floor = (base_value * value_floor_fraction()).round();
        let final_value = (base_value + total_adjustment).round().max(floor);

        if final_value <= Decimal::ZERO {
            return Err(ValuationError::InvariantViolation(format!(
                "final value {final_value} is not positive (base {base_value}, adjustments {total_adjustment})"
            )));
        }
        if confidence_score > 100 {
            return Err(ValuationError::InvariantViolation(format!(
                "confidence score {confidence_score} outside [0, 100]"
            )));
        }

        let band = Decimal::from_f64(range_band).ok_or_else(|| {
            ValuationError::InvariantViolation(format!("range band {range_band} is not a number"))
        })?;
        let low = (final_value * (Decimal::ONE - band)).round();
        let high = (final_value * (Decimal::ONE + band)).round();
        if low >= high {
            return Err(ValuationError::InvariantViolation(format!(
                "degenerate price range [{low}, {high}]"
            )));
        }

        Ok(ValuationResult {
            base_value: base_value.round(),
            final_value,
            price_range: (low, high),
            confidence_score,
            confidence_breakdown,
            adjustments,
            market_listings,
            sources_used,
            outcome,
            explanation: String::new(),
        })
    }
}

/// Deduplicated source names, first occurrence order preserved.
pub fn sources_of(listings: &[QualityListing]) -> Vec<String> {
    let mut seen = Vec::new();
    for l in listings {
        if !seen.iter().any(|s: &String| s == &l.listing.source) {
            seen.push(l.listing.source.clone());
        }
    }
    seen
}
