//! Price statistics over quality listings: percentiles for the Tukey fence
//! and the trust-weighted median that anchors the base value.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::core::types::QualityListing;

/// Percentile by the floor-index convention over an ascending-sorted slice:
/// `sorted[floor(n * q)]`. Callers pass q < 1.0.
pub fn percentile(sorted_prices: &[Decimal], q: f64) -> Option<Decimal> {
    if sorted_prices.is_empty() {
        return None;
    }
    let idx = ((sorted_prices.len() as f64) * q).floor() as usize;
    sorted_prices.get(idx.min(sorted_prices.len() - 1)).copied()
}

/// Population variance of prices, in f64. Used only for the confidence
/// variance component, where score arithmetic is floating point anyway.
pub fn price_variance(listings: &[QualityListing]) -> f64 {
    if listings.is_empty() {
        return 0.0;
    }
    let prices: Vec<f64> = listings
        .iter()
        .map(|l| l.price().to_f64().unwrap_or(0.0))
        .collect();
    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / prices.len() as f64
}

/// Trust-weighted median price.
///
/// Listings are sorted by price ascending (ties broken by source then
/// mileage, so repeated runs over the same snapshot agree); each listing
/// contributes its trust weight to a running total, and the median is the
/// price of the first listing whose cumulative weight reaches half of the
/// total weight.
pub fn weighted_median(listings: &[QualityListing]) -> Option<Decimal> {
    if listings.is_empty() {
        return None;
    }

    let mut sorted: Vec<&QualityListing> = listings.iter().collect();
    sorted.sort_by(|a, b| {
        a.price()
            .cmp(&b.price())
            .then_with(|| a.listing.source.cmp(&b.listing.source))
            .then_with(|| a.listing.mileage.cmp(&b.listing.mileage))
    });

    let total_weight: f64 = sorted.iter().map(|l| l.trust_weight()).sum();
    let half = total_weight / 2.0;

    let mut cumulative = 0.0;
    for listing in &sorted {
        cumulative += listing.trust_weight();
        if cumulative >= half {
            return Some(listing.price());
        }
    }

    // Floating point slack can leave the last listing just short of half.
    sorted.last().map(|l| l.price())
}
