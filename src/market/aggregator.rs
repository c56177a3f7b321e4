//! Concurrent multi-source listing search.
//!
//! Sources are queried in parallel with a per-source timeout; a failed or
//! slow source costs its own results, never the whole search. Merged
//! results are deduplicated before they reach the filter.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::types::RawListing;
use crate::market::client::{ListingQuery, MarketSearchClient};

pub struct MarketSearchAggregator {
    clients: Vec<Arc<dyn MarketSearchClient>>,
    search_timeout: Duration,
}

impl MarketSearchAggregator {
    pub fn new(clients: Vec<Arc<dyn MarketSearchClient>>, search_timeout: Duration) -> Self {
        Self {
            clients,
            search_timeout,
        }
    }

    pub async fn search_all(&self, query: &ListingQuery) -> Vec<RawListing> {
        let searches = self.clients.iter().map(|client| {
            let client = Arc::clone(client);
            let query = query.clone();
            let timeout = self.search_timeout;
            async move {
                let name = client.source_name().to_string();
                match tokio::time::timeout(timeout, client.search_listings(&query)).await {
                    Ok(Ok(listings)) => (name, listings),
                    Ok(Err(e)) => {
                        warn!(source = %name, error = %e, "market source failed");
                        (name, Vec::new())
                    }
                    Err(_) => {
                        warn!(source = %name, ?timeout, "market source timed out");
                        (name, Vec::new())
                    }
                }
            }
        });

        let mut merged = Vec::new();
        for (name, listings) in join_all(searches).await {
            info!(source = %name, count = listings.len(), "market source responded");
            merged.extend(listings);
        }

        let before = merged.len();
        let deduped = dedupe(merged);
        if deduped.len() < before {
            info!(dropped = before - deduped.len(), "duplicate listings merged away");
        }
        deduped
    }
}

/// Drop repeated observations of the same vehicle. The URL identifies a
/// listing when present; otherwise a composite of source, price, mileage
/// and year stands in.
fn dedupe(listings: Vec<RawListing>) -> Vec<RawListing> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();
    for listing in listings {
        let key = match (&listing.url, &listing.vin) {
            (Some(url), _) => format!("url:{url}"),
            (None, Some(vin)) => format!("vin:{vin}"),
            _ => format!(
                "{}:{}:{}:{}",
                listing.source,
                listing.price,
                listing.mileage.unwrap_or(-1),
                listing.year.unwrap_or(-1)
            ),
        };
        if seen.insert(key) {
            unique.push(listing);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::simulator::SimMarketSearchClient;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    struct FailingClient;

    #[async_trait]
    impl MarketSearchClient for FailingClient {
        fn source_name(&self) -> &str {
            "failing"
        }

        async fn search_listings(&self, _query: &ListingQuery) -> anyhow::Result<Vec<RawListing>> {
            Err(anyhow!("source unavailable"))
        }
    }

    fn query() -> ListingQuery {
        ListingQuery {
            make: "toyota".to_string(),
            model: "camry".to_string(),
            year: 2019,
            trim: None,
            zip_code: None,
            radius_miles: 100,
        }
    }

    fn listing(price: i64, url: Option<&str>) -> RawListing {
        RawListing {
            price: Decimal::from(price),
            mileage: Some(40_000),
            year: Some(2019),
            trim: None,
            condition: None,
            source: "cargurus".to_string(),
            source_trust_weight: Some(0.9),
            url: url.map(|u| u.to_string()),
            location: None,
            vin: None,
            dealer_name: None,
        }
    }

    #[tokio::test]
    async fn failed_source_does_not_sink_the_search() {
        let agg = MarketSearchAggregator::new(
            vec![
                Arc::new(FailingClient),
                Arc::new(SimMarketSearchClient::sample()),
            ],
            Duration::from_secs(5),
        );
        let merged = agg.search_all(&query()).await;
        assert_eq!(merged.len(), 12);
    }

    #[tokio::test]
    async fn duplicate_urls_are_merged() {
        let duplicated = vec![
            listing(19_000, Some("https://x/1")),
            listing(19_000, Some("https://x/1")),
            listing(19_500, None),
        ];
        let agg = MarketSearchAggregator::new(
            vec![Arc::new(SimMarketSearchClient::new("dup", duplicated))],
            Duration::from_secs(5),
        );
        let merged = agg.search_all(&query()).await;
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn composite_key_dedupes_unlinked_listings() {
        let twice = vec![listing(19_000, None), listing(19_000, None)];
        assert_eq!(dedupe(twice).len(), 1);
    }
}
