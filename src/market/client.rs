use anyhow::Result;
use async_trait::async_trait;

use crate::core::types::RawListing;

/// Search criteria handed to a market source. The engine does not care how
/// a source obtains its data (API, cache, scrape); it only requires the
/// merged `RawListing` set as input.
#[derive(Clone, Debug)]
pub struct ListingQuery {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub trim: Option<String>,
    pub zip_code: Option<String>,
    pub radius_miles: u32,
}

#[async_trait]
pub trait MarketSearchClient: Send + Sync + 'static {
    /// Stable identifier of this source, used in logs and result metadata.
    fn source_name(&self) -> &str;

    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<RawListing>>;
}
