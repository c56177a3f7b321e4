//! Depreciation-curve baseline estimator.
//!
//! Terminal fallback when every market-backed strategy comes up empty: a
//! make-level price anchor depreciated by vehicle age. Deliberately crude;
//! results through this path carry a fixed low confidence and the wide
//! price band.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::core::types::NormalizedRequest;

/// Confidence reported for baseline-only valuations.
pub const BASELINE_CONFIDENCE: u8 = 40;

const ANNUAL_DEPRECIATION: f64 = 0.10;
const MINIMUM_VALUE: i64 = 5_000;
const DEFAULT_ANCHOR: i64 = 20_000;

/// Typical recent-model price anchors by make.
fn make_anchor(make: &str) -> i64 {
    match make {
        "toyota" => 25_000,
        "honda" => 22_000,
        "ford" => 20_000,
        "chevrolet" => 18_000,
        "nissan" => 19_000,
        "hyundai" => 17_000,
        "bmw" => 35_000,
        "mercedes-benz" | "mercedes" => 40_000,
        "audi" => 32_000,
        "lexus" => 30_000,
        _ => DEFAULT_ANCHOR,
    }
}

#[derive(Default)]
pub struct BaselineEstimator;

impl BaselineEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Age-depreciated anchor value, floored at the minimum resale value.
    pub fn estimate(&self, request: &NormalizedRequest) -> Decimal {
        let anchor = make_anchor(&request.vehicle.make) as f64;
        let age = request.vehicle_age();
        let depreciated = anchor * (1.0 - ANNUAL_DEPRECIATION).powi(age);
        let value = depreciated.max(MINIMUM_VALUE as f64);
        Decimal::from_f64(value).unwrap_or(Decimal::from(MINIMUM_VALUE)).round()
    }
}
