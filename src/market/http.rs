//! HTTP-backed market source.
//!
//! Listing payloads arrive loosely shaped; everything is validated and
//! canonicalized here, at the collaborator boundary, so no unvalidated
//! shape ever reaches the listing filter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::config::config::MarketSourceCfg;
use crate::core::types::RawListing;
use crate::market::client::{ListingQuery, MarketSearchClient};
use crate::valuation::sources;

/// Wire shape of one listing as returned by a source endpoint. Every field
/// that callers cannot be trusted to populate is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingPayload {
    price: Option<Decimal>,
    #[serde(default)]
    mileage: Option<i64>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    trim: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    vin: Option<String>,
    #[serde(default)]
    dealer_name: Option<String>,
}

pub struct HttpMarketSearchClient {
    client: Client,
    cfg: MarketSourceCfg,
}

impl HttpMarketSearchClient {
    pub fn new(cfg: MarketSourceCfg, client: Client) -> Self {
        Self { client, cfg }
    }

    /// Canonicalize one payload. Listings without a positive price are
    /// rejected here rather than downstream.
    fn into_listing(&self, payload: ListingPayload) -> Option<RawListing> {
        let price = match payload.price {
            Some(p) if p > Decimal::ZERO => p,
            other => {
                warn!(source = %self.cfg.id, ?other, "listing rejected: missing or non-positive price");
                return None;
            }
        };

        let source = payload
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.cfg.id.clone());
        let trust = sources::trust_weight(&source);

        Some(RawListing {
            price,
            mileage: payload.mileage.filter(|m| *m >= 0),
            year: payload.year,
            trim: payload.trim.filter(|t| !t.trim().is_empty()),
            condition: payload.condition.filter(|c| !c.trim().is_empty()),
            source,
            source_trust_weight: Some(trust),
            url: payload.url,
            location: payload.location,
            vin: payload.vin,
            dealer_name: payload.dealer_name,
        })
    }
}

#[async_trait]
impl MarketSearchClient for HttpMarketSearchClient {
    fn source_name(&self) -> &str {
        &self.cfg.id
    }

    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<RawListing>> {
        let mut request = self
            .client
            .get(&self.cfg.base_url)
            .query(&[
                ("make", query.make.as_str()),
                ("model", query.model.as_str()),
            ])
            .query(&[("year", query.year)])
            .query(&[("radiusMiles", query.radius_miles)]);

        if let Some(trim) = &query.trim {
            request = request.query(&[("trim", trim.as_str())]);
        }
        if let Some(zip) = &query.zip_code {
            request = request.query(&[("zip", zip.as_str())]);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("requesting listings from {}", self.cfg.id))?;

        if !resp.status().is_success() {
            anyhow::bail!("{} listing search failed: {}", self.cfg.id, resp.status());
        }

        let payloads: Vec<ListingPayload> = resp
            .json()
            .await
            .with_context(|| format!("parsing listings from {}", self.cfg.id))?;

        let total = payloads.len();
        let listings: Vec<RawListing> = payloads
            .into_iter()
            .filter_map(|p| self.into_listing(p))
            .collect();
        if listings.len() < total {
            warn!(
                source = %self.cfg.id,
                rejected = total - listings.len(),
                "dropped malformed listing payloads at the boundary"
            );
        }
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpMarketSearchClient {
        HttpMarketSearchClient::new(
            MarketSourceCfg {
                id: "cargurus".to_string(),
                base_url: "http://localhost/listings".to_string(),
            },
            Client::new(),
        )
    }

    #[test]
    fn payload_without_price_is_rejected() {
        let payload = ListingPayload {
            price: None,
            mileage: Some(40_000),
            year: Some(2019),
            trim: None,
            condition: None,
            source: None,
            url: None,
            location: None,
            vin: None,
            dealer_name: None,
        };
        assert!(client().into_listing(payload).is_none());
    }

    #[test]
    fn payload_inherits_source_and_trust_weight() {
        let payload = ListingPayload {
            price: Some(Decimal::from(19_000)),
            mileage: Some(-5), // negative mileage dropped, listing kept
            year: Some(2019),
            trim: Some("XLE".to_string()),
            condition: None,
            source: None,
            url: None,
            location: None,
            vin: None,
            dealer_name: None,
        };
        let listing = client().into_listing(payload).unwrap();
        assert_eq!(listing.source, "cargurus");
        assert_eq!(listing.source_trust_weight, Some(0.9));
        assert_eq!(listing.mileage, None);
    }
}
