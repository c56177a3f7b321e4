//! Listing quality filter.
//!
//! Stages run in a fixed order because each one narrows the candidate set
//! and outlier detection is only meaningful after the comparison windows
//! have been applied:
//!   1. year window (±3, unknown year kept)
//!   2. mileage window (±25000, unknown mileage kept)
//!   3. trim soft filter (skipped when it would over-prune a small set)
//!   4. Tukey fence outlier rejection (only with >= 5 candidates)
//!   5. price/mileage sanity bounds

use rust_decimal::Decimal;
use tracing::debug;

use crate::core::types::{QualityListing, RawListing};
use crate::valuation::stats::percentile;

const YEAR_WINDOW: i32 = 3;
const MILEAGE_WINDOW: i64 = 25_000;
const MIN_CANDIDATES_FOR_OUTLIER_REJECTION: usize = 5;
const PRICE_FLOOR: i64 = 1_000;
const PRICE_CEILING: i64 = 200_000;
const MILEAGE_CEILING: i64 = 400_000;

/// Target attributes the candidates are compared against.
#[derive(Clone, Debug)]
pub struct FilterTarget {
    pub year: i32,
    pub mileage: i64,
    pub trim: Option<String>,
}

#[derive(Default)]
pub struct ListingFilter;

impl ListingFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn filter(&self, listings: Vec<RawListing>, target: &FilterTarget) -> Vec<QualityListing> {
        let input_count = listings.len();

        // 1. Year window. Listings that don't state a year get the benefit
        // of the doubt.
        let mut candidates: Vec<RawListing> = listings
            .into_iter()
            .filter(|l| match l.year {
                Some(year) => (year - target.year).abs() <= YEAR_WINDOW,
                None => true,
            })
            .collect();

        // 2. Mileage window, same benefit of the doubt.
        candidates.retain(|l| match l.mileage {
            Some(m) => (m - target.mileage).abs() <= MILEAGE_WINDOW,
            None => true,
        });

        // 3. Trim soft filter. Only narrow when the trim-matched subset keeps
        // at least max(3, 0.3 * current) listings; below that, data
        // availability wins over trim precision.
        if let Some(trim) = target.trim.as_deref() {
            let wanted = trim.to_lowercase();
            if !wanted.is_empty() {
                let matched: Vec<RawListing> = candidates
                    .iter()
                    .filter(|l| {
                        l.trim
                            .as_deref()
                            .map(|t| t.to_lowercase().contains(&wanted))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect();
                let retention_floor = (3.0_f64).max(0.3 * candidates.len() as f64);
                if matched.len() as f64 >= retention_floor {
                    candidates = matched;
                } else {
                    debug!(
                        matched = matched.len(),
                        total = candidates.len(),
                        "trim filter skipped to avoid over-pruning"
                    );
                }
            }
        }

        // 4. Tukey fences. Statistically meaningless below 5 candidates.
        if candidates.len() >= MIN_CANDIDATES_FOR_OUTLIER_REJECTION {
            let mut prices: Vec<Decimal> = candidates.iter().map(|l| l.price).collect();
            prices.sort();
            if let (Some(q1), Some(q3)) = (percentile(&prices, 0.25), percentile(&prices, 0.75)) {
                let iqr = q3 - q1;
                let spread = Decimal::new(15, 1) * iqr; // 1.5 * IQR
                let lower = q1 - spread;
                let upper = q3 + spread;
                candidates.retain(|l| l.price >= lower && l.price <= upper);
            }
        }

        // 5. Sanity bounds.
        candidates.retain(|l| {
            l.price >= Decimal::from(PRICE_FLOOR)
                && l.price <= Decimal::from(PRICE_CEILING)
                && l.mileage.map(|m| (0..=MILEAGE_CEILING).contains(&m)).unwrap_or(true)
        });

        debug!(
            input = input_count,
            quality = candidates.len(),
            "listing filter complete"
        );

        candidates
            .into_iter()
            .map(|listing| QualityListing { listing })
            .collect()
    }
}
