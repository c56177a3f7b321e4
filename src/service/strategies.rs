//! Ordered data-source strategies.
//!
//! Each market-backed strategy names the query it issues, the confidence
//! cap it tolerates, and the price band it reports. The chain is explicit:
//! exact match first, then progressively broader searches, with the
//! depreciation baseline as the terminal fallback handled by the service.

use crate::core::types::{NormalizedRequest, StrategyOutcome};
use crate::market::client::ListingQuery;
use crate::valuation::composer::{DEFAULT_RANGE_BAND, FALLBACK_RANGE_BAND};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Full criteria: make, model, year, trim, local radius.
    ExactMatch,
    /// Trim dropped, radius widened.
    SimilarVehicles,
    /// Make and model only, region-wide.
    BroaderSearch,
}

impl SearchStrategy {
    pub const CHAIN: [SearchStrategy; 3] = [
        SearchStrategy::ExactMatch,
        SearchStrategy::SimilarVehicles,
        SearchStrategy::BroaderSearch,
    ];

    pub fn outcome(&self) -> StrategyOutcome {
        match self {
            SearchStrategy::ExactMatch => StrategyOutcome::ExactMatch,
            SearchStrategy::SimilarVehicles => StrategyOutcome::SimilarVehicles,
            SearchStrategy::BroaderSearch => StrategyOutcome::BroaderSearch,
        }
    }

    /// Ceiling on the engine's confidence score for results obtained
    /// through this strategy. Looser searches report less certainty no
    /// matter how tidy the listing set looks.
    pub fn confidence_cap(&self) -> u8 {
        match self {
            SearchStrategy::ExactMatch => 95,
            SearchStrategy::SimilarVehicles => 85,
            SearchStrategy::BroaderSearch => 70,
        }
    }

    pub fn range_band(&self) -> f64 {
        match self {
            SearchStrategy::ExactMatch | SearchStrategy::SimilarVehicles => DEFAULT_RANGE_BAND,
            SearchStrategy::BroaderSearch => FALLBACK_RANGE_BAND,
        }
    }

    pub fn query(&self, request: &NormalizedRequest, base_radius_miles: u32) -> ListingQuery {
        match self {
            SearchStrategy::ExactMatch => ListingQuery {
                make: request.vehicle.make.clone(),
                model: request.vehicle.model.clone(),
                year: request.vehicle.year,
                trim: request.vehicle.trim.clone(),
                zip_code: Some(request.zip_code.clone()),
                radius_miles: base_radius_miles,
            },
            SearchStrategy::SimilarVehicles => ListingQuery {
                make: request.vehicle.make.clone(),
                model: request.vehicle.model.clone(),
                year: request.vehicle.year,
                trim: None,
                zip_code: Some(request.zip_code.clone()),
                radius_miles: base_radius_miles.saturating_mul(2),
            },
            SearchStrategy::BroaderSearch => ListingQuery {
                make: request.vehicle.make.clone(),
                model: request.vehicle.model.clone(),
                year: request.vehicle.year,
                trim: None,
                zip_code: None,
                radius_miles: base_radius_miles.saturating_mul(5),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Condition, NormalizedVehicle, TitleStatus};

    fn request() -> NormalizedRequest {
        NormalizedRequest {
            vin: "1HGCM82633A004352".to_string(),
            zip_code: "90210".to_string(),
            mileage: 45_000,
            condition: Condition::Good,
            title_status: TitleStatus::Clean,
            vehicle: NormalizedVehicle {
                make: "toyota".to_string(),
                model: "camry".to_string(),
                year: 2019,
                trim: Some("xle".to_string()),
                fuel_type: None,
            },
            as_of_year: 2024,
        }
    }

    #[test]
    fn chain_widens_progressively() {
        let req = request();

        let exact = SearchStrategy::ExactMatch.query(&req, 100);
        assert_eq!(exact.trim.as_deref(), Some("xle"));
        assert_eq!(exact.zip_code.as_deref(), Some("90210"));
        assert_eq!(exact.radius_miles, 100);

        let similar = SearchStrategy::SimilarVehicles.query(&req, 100);
        assert!(similar.trim.is_none());
        assert_eq!(similar.radius_miles, 200);

        let broad = SearchStrategy::BroaderSearch.query(&req, 100);
        assert!(broad.zip_code.is_none());
        assert_eq!(broad.radius_miles, 500);
    }

    #[test]
    fn looser_strategies_cap_confidence_lower() {
        assert!(
            SearchStrategy::ExactMatch.confidence_cap()
                > SearchStrategy::SimilarVehicles.confidence_cap()
        );
        assert!(
            SearchStrategy::SimilarVehicles.confidence_cap()
                > SearchStrategy::BroaderSearch.confidence_cap()
        );
    }
}
