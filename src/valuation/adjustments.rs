//! Independent value adjustments against the market base value.
//!
//! Four order-insensitive deltas: regional demand, mileage against the
//! expected-use curve, reported condition, and title history. The composer
//! owns the 30%-of-base floor on the combined result.

use lazy_static::lazy_static;
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::core::types::{AdjustmentEntry, Condition, NormalizedRequest, TitleStatus};

const EXPECTED_MILES_PER_YEAR: i64 = 12_000;

lazy_static! {
    /// High-demand metro ZIP codes. A coarse placeholder for a real
    /// demand-density model; listed ZIPs get a flat +5% of base.
    static ref HIGH_DEMAND_ZIPS: HashSet<&'static str> = [
        "90210", "90401", "94105", "94301", "98101", "98004", "10001", "10011",
        "33139", "33480", "78701", "78746", "60611", "30305", "85251", "80202",
        "92660", "89109",
    ]
    .into_iter()
    .collect();
}

#[derive(Default)]
pub struct AdjustmentCalculator;

impl AdjustmentCalculator {
    pub fn new() -> Self {
        Self
    }

    /// All four adjustments, including zero-impact entries. Display layers
    /// may drop the zeroes; the engine keeps them computable and auditable.
    pub fn compute(&self, base: Decimal, request: &NormalizedRequest) -> Vec<AdjustmentEntry> {
        vec![
            self.location_adjustment(base, request),
            self.mileage_adjustment(request),
            self.condition_adjustment(base, request),
            self.title_penalty(base, request),
        ]
    }

    fn location_adjustment(&self, base: Decimal, request: &NormalizedRequest) -> AdjustmentEntry {
        let impact = if HIGH_DEMAND_ZIPS.contains(request.zip_code.as_str()) {
            (base * Decimal::new(5, 2)).round()
        } else {
            Decimal::ZERO
        };
        AdjustmentEntry {
            factor: "Regional Market".to_string(),
            impact,
            description: format!("ZIP {} area demand", request.zip_code),
        }
    }

    /// Dollars-per-mile rate by vehicle segment. Electric drivetrains wear
    /// differently and depreciate less per mile; full-size truck makes hold
    /// value better than the sedan default.
    fn per_mile_rate(request: &NormalizedRequest) -> Decimal {
        let electric = request
            .vehicle
            .fuel_type
            .as_deref()
            .map(|f| f.contains("electric"))
            .unwrap_or(false);
        if electric {
            return Decimal::new(10, 2); // 0.10
        }
        match request.vehicle.make.as_str() {
            "ford" | "chevrolet" | "ram" => Decimal::new(12, 2), // 0.12
            _ => Decimal::new(15, 2),                            // 0.15
        }
    }

    fn mileage_adjustment(&self, request: &NormalizedRequest) -> AdjustmentEntry {
        let expected = i64::from(request.vehicle_age()) * EXPECTED_MILES_PER_YEAR;
        let delta_miles = request.mileage - expected;
        let rate = Self::per_mile_rate(request);
        let impact = (-Decimal::from(delta_miles) * rate).round();
        AdjustmentEntry {
            factor: "Mileage".to_string(),
            impact,
            description: format!(
                "{} miles vs {} expected for a {}-year-old vehicle",
                request.mileage,
                expected,
                request.vehicle_age()
            ),
        }
    }

    fn condition_adjustment(&self, base: Decimal, request: &NormalizedRequest) -> AdjustmentEntry {
        let multiplier = match request.condition {
            Condition::Excellent => Decimal::new(105, 2),
            Condition::VeryGood => Decimal::new(102, 2),
            Condition::Good => Decimal::new(100, 2),
            Condition::Fair => Decimal::new(95, 2),
            Condition::Poor => Decimal::new(85, 2),
        };
        let impact = (base * (multiplier - Decimal::ONE)).round();
        AdjustmentEntry {
            factor: "Condition".to_string(),
            impact,
            description: format!("{} condition", request.condition),
        }
    }

    fn title_penalty(&self, base: Decimal, request: &NormalizedRequest) -> AdjustmentEntry {
        let multiplier = match request.title_status {
            TitleStatus::Clean => Decimal::ZERO,
            TitleStatus::Rebuilt => Decimal::new(-25, 2),
            TitleStatus::Salvage => Decimal::new(-45, 2),
            TitleStatus::Flood => Decimal::new(-40, 2),
            TitleStatus::Lemon => Decimal::new(-30, 2),
        };
        let impact = (base * multiplier).round();
        AdjustmentEntry {
            factor: "Title".to_string(),
            impact,
            description: format!("{} title", request.title_status),
        }
    }
}
