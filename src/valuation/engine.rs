//! The pure valuation pipeline.
//!
//! filter -> weighted statistics -> adjustments -> confidence -> compose.
//! No I/O, no clock reads, no randomness: identical inputs produce
//! bit-identical results. Collaborator plumbing (market search, decode,
//! caching, persistence) lives in the service layer.

use tracing::debug;

use crate::core::error::ValuationError;
use crate::core::types::{NormalizedRequest, RawListing, StrategyOutcome, ValuationResult};
use crate::valuation::adjustments::AdjustmentCalculator;
use crate::valuation::composer::{sources_of, ValuationComposer};
use crate::valuation::confidence::ConfidenceScorer;
use crate::valuation::explanation;
use crate::valuation::filters::{FilterTarget, ListingFilter};
use crate::valuation::stats::weighted_median;

pub struct ValuationEngine {
    filter: ListingFilter,
    adjustments: AdjustmentCalculator,
    confidence: ConfidenceScorer,
    composer: ValuationComposer,
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationEngine {
    pub fn new() -> Self {
        Self {
            filter: ListingFilter::new(),
            adjustments: AdjustmentCalculator::new(),
            confidence: ConfidenceScorer::new(),
            composer: ValuationComposer::new(),
        }
    }

    pub fn adjustment_calculator(&self) -> &AdjustmentCalculator {
        &self.adjustments
    }

    pub fn composer(&self) -> &ValuationComposer {
        &self.composer
    }

    /// Run the full pipeline over one merged listing snapshot.
    ///
    /// An empty quality set is a hard `InsufficientData` failure: the engine
    /// never silently falls back to unfiltered data. The caller decides
    /// whether to retry with a broader search or a baseline model.
    pub fn appraise(
        &self,
        request: &NormalizedRequest,
        listings: Vec<RawListing>,
        range_band: f64,
        outcome: StrategyOutcome,
    ) -> Result<ValuationResult, ValuationError> {
        let candidates = listings.len();
        let target = FilterTarget {
            year: request.vehicle.year,
            mileage: request.mileage,
            trim: request.vehicle.trim.clone(),
        };

        let quality = self.filter.filter(listings, &target);
        if quality.is_empty() {
            return Err(ValuationError::InsufficientData { candidates });
        }

        let base_value = weighted_median(&quality)
            .ok_or(ValuationError::InsufficientData { candidates })?;
        debug!(%base_value, quality = quality.len(), "weighted median established");

        let adjustments = self.adjustments.compute(base_value, request);
        let (confidence_score, breakdown) = self.confidence.score(&quality, request);

        let sources = sources_of(&quality);
        let mut result = self.composer.compose(
            base_value,
            adjustments,
            confidence_score,
            breakdown,
            quality,
            sources,
            range_band,
            outcome,
        )?;
        result.explanation = explanation::narrative(request, &result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Condition, NormalizedVehicle, TitleStatus};
    use crate::valuation::composer::DEFAULT_RANGE_BAND;
    use rust_decimal::Decimal;

    fn request() -> NormalizedRequest {
        NormalizedRequest {
            vin: "1HGCM82633A004352".to_string(),
            zip_code: "11111".to_string(),
            mileage: 45_000,
            condition: Condition::Good,
            title_status: TitleStatus::Clean,
            vehicle: NormalizedVehicle {
                make: "toyota".to_string(),
                model: "camry".to_string(),
                year: 2019,
                // Age 5 at as_of 2024 -> expected mileage 60000, so the
                // 45000-mile request earns a positive mileage adjustment.
                trim: None,
                fuel_type: None,
            },
            as_of_year: 2024,
        }
    }

    fn listing(price: i64) -> RawListing {
        RawListing {
            price: Decimal::from(price),
            mileage: Some(45_000),
            year: Some(2019),
            trim: None,
            condition: None,
            source: "cargurus".to_string(),
            source_trust_weight: Some(0.9),
            url: None,
            location: None,
            vin: None,
            dealer_name: None,
        }
    }

    fn scenario_listings() -> Vec<RawListing> {
        [
            18_000, 18_500, 19_000, 19_200, 19_500, 19_800, 20_000, 20_200, 20_500, 21_000,
            21_500, 95_000,
        ]
        .iter()
        .map(|p| listing(*p))
        .collect()
    }

    #[test]
    fn outlier_is_rejected_and_median_lands_in_band() {
        let engine = ValuationEngine::new();
        let result = engine
            .appraise(
                &request(),
                scenario_listings(),
                DEFAULT_RANGE_BAND,
                StrategyOutcome::ExactMatch,
            )
            .unwrap();

        assert_eq!(result.market_listings.len(), 11);
        assert!(result.base_value >= Decimal::from(19_000));
        assert!(result.base_value <= Decimal::from(20_500));
        let (low, high) = result.price_range;
        assert!(low < result.final_value && result.final_value < high);
        assert!(result.confidence_score <= 95);
    }

    #[test]
    fn identical_inputs_produce_identical_results() {
        let engine = ValuationEngine::new();
        let a = engine
            .appraise(
                &request(),
                scenario_listings(),
                DEFAULT_RANGE_BAND,
                StrategyOutcome::ExactMatch,
            )
            .unwrap();
        let b = engine
            .appraise(
                &request(),
                scenario_listings(),
                DEFAULT_RANGE_BAND,
                StrategyOutcome::ExactMatch,
            )
            .unwrap();

        assert_eq!(a.base_value, b.base_value);
        assert_eq!(a.final_value, b.final_value);
        assert_eq!(a.price_range, b.price_range);
        assert_eq!(a.confidence_score, b.confidence_score);
        assert_eq!(a.explanation, b.explanation);
    }

    #[test]
    fn zero_surviving_listings_is_insufficient_data() {
        let engine = ValuationEngine::new();
        // Every candidate fails the year window.
        let stale: Vec<RawListing> = (0..4)
            .map(|_| {
                let mut l = listing(18_000);
                l.year = Some(2010);
                l
            })
            .collect();
        let err = engine
            .appraise(&request(), stale, DEFAULT_RANGE_BAND, StrategyOutcome::ExactMatch)
            .unwrap_err();
        assert!(matches!(err, ValuationError::InsufficientData { candidates: 4 }));
    }

    #[test]
    fn empty_input_is_insufficient_data() {
        let engine = ValuationEngine::new();
        let err = engine
            .appraise(
                &request(),
                Vec::new(),
                DEFAULT_RANGE_BAND,
                StrategyOutcome::ExactMatch,
            )
            .unwrap_err();
        assert!(matches!(err, ValuationError::InsufficientData { candidates: 0 }));
    }

    #[test]
    fn floor_invariant_holds_for_catastrophic_history() {
        let engine = ValuationEngine::new();
        let mut req = request();
        req.condition = Condition::Poor;
        req.title_status = TitleStatus::Salvage;
        req.mileage = 200_000;

        // Keep the listing set valid for a 200k-mile target.
        let listings: Vec<RawListing> = [18_000, 19_000, 19_500, 20_000, 20_500]
            .iter()
            .map(|p| {
                let mut l = listing(*p);
                l.mileage = Some(195_000);
                l
            })
            .collect();

        let result = engine
            .appraise(&req, listings, DEFAULT_RANGE_BAND, StrategyOutcome::ExactMatch)
            .unwrap();
        let floor = (result.base_value * Decimal::new(3, 1)).round();
        assert!(result.final_value >= floor);
        assert!(result.final_value > Decimal::ZERO);
    }
}
