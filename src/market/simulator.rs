//! Deterministic in-memory market source for demos and tests. Returns a
//! fixed listing set; no randomness, so repeated valuations agree.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::types::RawListing;
use crate::market::client::{ListingQuery, MarketSearchClient};
use crate::valuation::sources;

pub struct SimMarketSearchClient {
    name: String,
    listings: Vec<RawListing>,
}

impl SimMarketSearchClient {
    pub fn new(name: &str, listings: Vec<RawListing>) -> Self {
        Self {
            name: name.to_string(),
            listings,
        }
    }

    /// A plausible comparable set for a mid-size 2019 sedan around 45k
    /// miles, including one deliberately absurd price so the demo shows the
    /// outlier fence working.
    pub fn sample() -> Self {
        let mk = |price: i64, mileage: i64, source: &str| RawListing {
            price: Decimal::from(price),
            mileage: Some(mileage),
            year: Some(2019),
            trim: Some("xle".to_string()),
            condition: None,
            source: source.to_string(),
            source_trust_weight: Some(sources::trust_weight(source)),
            url: None,
            location: None,
            vin: None,
            dealer_name: None,
        };
        Self::new(
            "simulator",
            vec![
                mk(18_000, 52_000, "cargurus"),
                mk(18_500, 49_000, "autotrader"),
                mk(19_000, 47_500, "cars.com"),
                mk(19_200, 46_000, "carmax"),
                mk(19_500, 44_000, "cargurus"),
                mk(19_800, 43_000, "facebook marketplace"),
                mk(20_000, 41_000, "craigslist"),
                mk(20_200, 40_000, "autotrader"),
                mk(20_500, 38_500, "offerup"),
                mk(21_000, 36_000, "cars.com"),
                mk(21_500, 34_000, "ebay motors"),
                mk(95_000, 45_000, "craigslist"),
            ],
        )
    }
}

#[async_trait]
impl MarketSearchClient for SimMarketSearchClient {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn search_listings(&self, _query: &ListingQuery) -> Result<Vec<RawListing>> {
        Ok(self.listings.clone())
    }
}
