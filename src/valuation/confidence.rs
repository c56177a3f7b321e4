//! Composite confidence score: six independently weighted components whose
//! caps sum to 100, with the total clamped at 95. Market data is inherently
//! noisy, so absolute certainty is never reported.

use rust_decimal::prelude::*;

use crate::core::types::{ConfidenceBreakdown, NormalizedRequest, QualityListing, TitleStatus};
use crate::valuation::stats::price_variance;

const VOLUME_CAP: f64 = 30.0;
const VARIANCE_CAP: f64 = 20.0;
const TRUST_CAP: f64 = 20.0;
const MILEAGE_CAP: f64 = 10.0;
const CONDITION_CAP: f64 = 10.0;
const TITLE_CAP: f64 = 10.0;

const VOLUME_SATURATION: f64 = 10.0;
const MILEAGE_PROXIMITY_MILES: i64 = 15_000;
const SCORE_CEILING: f64 = 95.0;

#[derive(Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        listings: &[QualityListing],
        request: &NormalizedRequest,
    ) -> (u8, ConfidenceBreakdown) {
        let n = listings.len() as f64;

        let listing_volume = (n / VOLUME_SATURATION).min(1.0) * VOLUME_CAP;

        // Tighter price clustering scores higher; the spread is judged
        // relative to the squared top price so the component is unitless.
        let listing_variance = if listings.is_empty() {
            0.0
        } else {
            let max_price = listings
                .iter()
                .map(|l| l.price().to_f64().unwrap_or(0.0))
                .fold(0.0_f64, f64::max);
            if max_price > 0.0 {
                (1.0 - price_variance(listings) / (max_price * max_price)).max(0.0) * VARIANCE_CAP
            } else {
                0.0
            }
        };

        let source_trust = if listings.is_empty() {
            0.0
        } else {
            listings.iter().map(|l| l.trust_weight()).sum::<f64>() / n * TRUST_CAP
        };

        // Listings without a stated mileage do not count as near.
        let mileage_proximity = if listings.is_empty() {
            0.0
        } else {
            let near = listings
                .iter()
                .filter(|l| {
                    l.listing
                        .mileage
                        .map(|m| (m - request.mileage).abs() <= MILEAGE_PROXIMITY_MILES)
                        .unwrap_or(false)
                })
                .count() as f64;
            near / n * MILEAGE_CAP
        };

        // A listing with no stated condition is assumed compatible.
        let condition_match = if listings.is_empty() {
            0.0
        } else {
            let wanted = request.condition.as_str();
            let matching = listings
                .iter()
                .filter(|l| match l.listing.condition.as_deref() {
                    Some(c) => c.trim().to_lowercase().replace(' ', "_") == wanted,
                    None => true,
                })
                .count() as f64;
            matching / n * CONDITION_CAP
        };

        let title_status = match request.title_status {
            TitleStatus::Clean => 1.0,
            TitleStatus::Rebuilt => 0.7,
            TitleStatus::Salvage => 0.3,
            _ => 0.8,
        } * TITLE_CAP;

        let breakdown = ConfidenceBreakdown {
            listing_volume,
            listing_variance,
            source_trust,
            mileage_proximity,
            condition_match,
            title_status,
        };

        let total = breakdown.total().min(SCORE_CEILING).max(0.0);
        (total.round() as u8, breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Condition, NormalizedVehicle, RawListing};
    use rust_decimal::Decimal;

    fn request(condition: Condition, title: TitleStatus) -> NormalizedRequest {
        NormalizedRequest {
            vin: "1HGCM82633A004352".to_string(),
            zip_code: "90210".to_string(),
            mileage: 45_000,
            condition,
            title_status: title,
            vehicle: NormalizedVehicle {
                make: "toyota".to_string(),
                model: "camry".to_string(),
                year: 2019,
                trim: None,
                fuel_type: None,
            },
            as_of_year: 2024,
        }
    }

    fn quality(price: i64, mileage: Option<i64>, condition: Option<&str>, weight: f64) -> QualityListing {
        QualityListing {
            listing: RawListing {
                price: Decimal::from(price),
                mileage,
                year: Some(2019),
                trim: None,
                condition: condition.map(|c| c.to_string()),
                source: "cargurus".to_string(),
                source_trust_weight: Some(weight),
                url: None,
                location: None,
                vin: None,
                dealer_name: None,
            },
        }
    }

    #[test]
    fn volume_component_saturates_at_ten_listings() {
        let scorer = ConfidenceScorer::new();
        let req = request(Condition::Good, TitleStatus::Clean);

        let five: Vec<QualityListing> =
            (0..5).map(|_| quality(19_000, Some(45_000), None, 0.9)).collect();
        let (_, b5) = scorer.score(&five, &req);
        assert!((b5.listing_volume - 15.0).abs() < 1e-9);

        let twelve: Vec<QualityListing> =
            (0..12).map(|_| quality(19_000, Some(45_000), None, 0.9)).collect();
        let (_, b12) = scorer.score(&twelve, &req);
        assert!((b12.listing_volume - 30.0).abs() < 1e-9);
    }

    #[test]
    fn score_never_exceeds_ninety_five() {
        let scorer = ConfidenceScorer::new();
        let req = request(Condition::Good, TitleStatus::Clean);
        // Ideal data: many identical, near, trusted, condition-matching listings.
        let listings: Vec<QualityListing> = (0..20)
            .map(|_| quality(19_000, Some(45_000), Some("good"), 1.0))
            .collect();
        let (score, breakdown) = scorer.score(&listings, &req);
        assert!(breakdown.total() > 95.0);
        assert_eq!(score, 95);
    }

    #[test]
    fn title_component_follows_table() {
        let scorer = ConfidenceScorer::new();
        let listings = vec![quality(19_000, Some(45_000), None, 0.9)];

        let (_, clean) = scorer.score(&listings, &request(Condition::Good, TitleStatus::Clean));
        assert!((clean.title_status - 10.0).abs() < 1e-9);

        let (_, rebuilt) = scorer.score(&listings, &request(Condition::Good, TitleStatus::Rebuilt));
        assert!((rebuilt.title_status - 7.0).abs() < 1e-9);

        let (_, salvage) = scorer.score(&listings, &request(Condition::Good, TitleStatus::Salvage));
        assert!((salvage.title_status - 3.0).abs() < 1e-9);

        let (_, flood) = scorer.score(&listings, &request(Condition::Good, TitleStatus::Flood));
        assert!((flood.title_status - 8.0).abs() < 1e-9);
    }

    #[test]
    fn mileage_proximity_counts_only_known_near_listings() {
        let scorer = ConfidenceScorer::new();
        let req = request(Condition::Good, TitleStatus::Clean);
        let listings = vec![
            quality(19_000, Some(50_000), None, 0.9), // within 15k
            quality(19_000, Some(70_000), None, 0.9), // 25k off
            quality(19_000, None, None, 0.9),         // unknown -> not near
            quality(19_000, Some(44_000), None, 0.9), // within 15k
        ];
        let (_, breakdown) = scorer.score(&listings, &req);
        // 2 of 4 near -> 5.0 of the 10-point cap.
        assert!((breakdown.mileage_proximity - 5.0).abs() < 1e-9);
    }

    #[test]
    fn condition_mismatches_lower_the_component() {
        let scorer = ConfidenceScorer::new();
        let req = request(Condition::Good, TitleStatus::Clean);
        let listings = vec![
            quality(19_000, Some(45_000), Some("good"), 0.9),
            quality(19_000, Some(45_000), Some("fair"), 0.9),
            quality(19_000, Some(45_000), None, 0.9), // absent counts as match
            quality(19_000, Some(45_000), Some("Very Good"), 0.9),
        ];
        let (_, breakdown) = scorer.score(&listings, &req);
        // 2 of 4 compatible -> 5.0 of the 10-point cap.
        assert!((breakdown.condition_match - 5.0).abs() < 1e-9);
    }

    #[test]
    fn tight_clustering_beats_wide_spread() {
        let scorer = ConfidenceScorer::new();
        let req = request(Condition::Good, TitleStatus::Clean);

        let tight: Vec<QualityListing> = [19_000, 19_100, 19_200]
            .iter()
            .map(|p| quality(*p, Some(45_000), None, 0.9))
            .collect();
        let wide: Vec<QualityListing> = [5_000, 19_000, 60_000]
            .iter()
            .map(|p| quality(*p, Some(45_000), None, 0.9))
            .collect();

        let (_, tight_b) = scorer.score(&tight, &req);
        let (_, wide_b) = scorer.score(&wide, &req);
        assert!(tight_b.listing_variance > wide_b.listing_variance);
    }
}
