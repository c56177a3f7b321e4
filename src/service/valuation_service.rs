//! Service layer: owns every collaborator (decode, market search, cache,
//! persistence) and walks the strategy chain around the pure engine.

use anyhow::Result;
use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cache::ValuationCache;
use crate::core::error::ValuationError;
use crate::core::types::{
    NormalizedRequest, RawValuationRequest, StrategyOutcome, ValuationResult,
};
use crate::decode::client::VehicleDecodeClient;
use crate::market::aggregator::MarketSearchAggregator;
use crate::persistence::database::Database;
use crate::service::baseline::{BaselineEstimator, BASELINE_CONFIDENCE};
use crate::service::strategies::SearchStrategy;
use crate::valuation::composer::FALLBACK_RANGE_BAND;
use crate::valuation::engine::ValuationEngine;
use crate::valuation::explanation;
use crate::valuation::normalize::RequestNormalizer;

pub struct ValuationService {
    engine: ValuationEngine,
    normalizer: RequestNormalizer,
    baseline: BaselineEstimator,
    aggregator: MarketSearchAggregator,
    decoder: Option<Arc<dyn VehicleDecodeClient>>,
    cache: Arc<dyn ValuationCache>,
    store: Option<Database>,
    base_radius_miles: u32,
}

impl ValuationService {
    pub fn new(
        aggregator: MarketSearchAggregator,
        decoder: Option<Arc<dyn VehicleDecodeClient>>,
        cache: Arc<dyn ValuationCache>,
        store: Option<Database>,
        base_radius_miles: u32,
    ) -> Self {
        Self {
            engine: ValuationEngine::new(),
            normalizer: RequestNormalizer::new(),
            baseline: BaselineEstimator::new(),
            aggregator,
            decoder,
            cache,
            store,
            base_radius_miles,
        }
    }

    /// End-to-end valuation of one raw request.
    ///
    /// Error taxonomy is preserved through the `anyhow` boundary: callers
    /// can downcast to `ValuationError` to distinguish validation problems
    /// from insufficient data from internal invariant failures.
    pub async fn appraise(&self, mut raw: RawValuationRequest) -> Result<ValuationResult> {
        // Resolve vehicle attributes before validation so the normalizer
        // sees the complete request.
        if raw.vehicle.is_none() {
            if let Some(decoder) = &self.decoder {
                info!(vin = %raw.vin, "decoding VIN via collaborator");
                raw.vehicle = Some(decoder.decode(&raw.vin).await?);
            }
        }

        let request = self
            .normalizer
            .normalize(&raw, Utc::now().year())
            .map_err(ValuationError::Validation)?;

        let cache_key = cache_key(&request);
        if let Some(hit) = self.cache.get(&cache_key) {
            info!(vin = %request.vin, "valuation served from cache");
            return Ok(hit);
        }

        let result = self.run_strategy_chain(&request).await?;

        self.cache.put(cache_key, result.clone());
        if let Some(store) = &self.store {
            match store.save_valuation(&request, &result).await {
                Ok(id) => info!(id, "valuation persisted"),
                Err(e) => error!(error = %e, "failed to persist valuation"),
            }
        }

        Ok(result)
    }

    async fn run_strategy_chain(&self, request: &NormalizedRequest) -> Result<ValuationResult> {
        for strategy in SearchStrategy::CHAIN {
            let query = strategy.query(request, self.base_radius_miles);
            let listings = self.aggregator.search_all(&query).await;
            info!(
                strategy = %strategy.outcome(),
                candidates = listings.len(),
                "strategy search complete"
            );

            if listings.is_empty() {
                continue;
            }

            match self.engine.appraise(
                request,
                listings,
                strategy.range_band(),
                strategy.outcome(),
            ) {
                Ok(mut result) => {
                    let cap = strategy.confidence_cap();
                    if result.confidence_score > cap {
                        result.confidence_score = cap;
                    }
                    return Ok(result);
                }
                Err(ValuationError::InsufficientData { candidates }) => {
                    warn!(
                        strategy = %strategy.outcome(),
                        candidates,
                        "no quality listings survived filtering; widening search"
                    );
                    continue;
                }
                // Invariant violations are internal defects: halt, never
                // degrade to a fallback number.
                Err(e) => return Err(e.into()),
            }
        }

        warn!(vin = %request.vin, "all market strategies exhausted; using baseline estimate");
        self.baseline_valuation(request)
    }

    fn baseline_valuation(&self, request: &NormalizedRequest) -> Result<ValuationResult> {
        let base = self.baseline.estimate(request);
        let adjustments = self.engine.adjustment_calculator().compute(base, request);

        let mut result = self.engine.composer().compose(
            base,
            adjustments,
            BASELINE_CONFIDENCE,
            Default::default(),
            Vec::new(),
            vec!["baseline_estimate".to_string()],
            FALLBACK_RANGE_BAND,
            StrategyOutcome::BaselineEstimate,
        )?;
        result.explanation = explanation::narrative(request, &result);
        Ok(result)
    }
}

fn cache_key(request: &NormalizedRequest) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        request.vin,
        request.zip_code,
        request.mileage,
        request.condition,
        request.title_status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlValuationCache;
    use crate::core::types::DecodedVehicle;
    use crate::market::client::MarketSearchClient;
    use crate::market::simulator::SimMarketSearchClient;
    use std::time::Duration;

    fn raw_request() -> RawValuationRequest {
        RawValuationRequest {
            vin: "1HGCM82633A004352".to_string(),
            zip_code: "90210".to_string(),
            mileage: 45_000,
            condition: "good".to_string(),
            title_status: "clean".to_string(),
            vehicle: Some(DecodedVehicle {
                make: "Toyota".to_string(),
                model: "Camry".to_string(),
                year: 2019,
                trim: Some("XLE".to_string()),
                fuel_type: None,
            }),
        }
    }

    fn service_with(clients: Vec<Arc<dyn MarketSearchClient>>) -> ValuationService {
        ValuationService::new(
            MarketSearchAggregator::new(clients, Duration::from_secs(5)),
            None,
            Arc::new(TtlValuationCache::new(16, Duration::from_secs(60))),
            None,
            100,
        )
    }

    #[tokio::test]
    async fn market_backed_valuation_uses_exact_match() {
        let service = service_with(vec![Arc::new(SimMarketSearchClient::sample())]);
        let result = service.appraise(raw_request()).await.unwrap();
        assert_eq!(result.outcome, StrategyOutcome::ExactMatch);
        // The simulator's 95000 outlier never survives the fence.
        assert_eq!(result.market_listings.len(), 11);
        assert!(result.confidence_score <= 95);
    }

    #[tokio::test]
    async fn empty_market_falls_back_to_baseline() {
        let service = service_with(vec![Arc::new(SimMarketSearchClient::new(
            "empty",
            Vec::new(),
        ))]);
        let result = service.appraise(raw_request()).await.unwrap();
        assert_eq!(result.outcome, StrategyOutcome::BaselineEstimate);
        assert_eq!(result.confidence_score, BASELINE_CONFIDENCE);
        assert!(result.market_listings.is_empty());
        assert_eq!(result.sources_used, vec!["baseline_estimate"]);
        assert!(result.final_value > rust_decimal::Decimal::ZERO);
    }

    #[tokio::test]
    async fn repeated_request_hits_the_cache() {
        let service = service_with(vec![Arc::new(SimMarketSearchClient::sample())]);
        let first = service.appraise(raw_request()).await.unwrap();
        let second = service.appraise(raw_request()).await.unwrap();
        assert_eq!(first.final_value, second.final_value);
        assert_eq!(first.explanation, second.explanation);
    }

    #[tokio::test]
    async fn validation_failures_surface_distinctly() {
        let service = service_with(vec![Arc::new(SimMarketSearchClient::sample())]);
        let mut raw = raw_request();
        raw.vin = "short".to_string();
        raw.zip_code = "abc".to_string();

        let err = service.appraise(raw).await.unwrap_err();
        match err.downcast_ref::<ValuationError>() {
            Some(ValuationError::Validation(issues)) => {
                assert_eq!(issues.len(), 2);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_vehicle_without_decoder_is_a_validation_error() {
        let service = service_with(vec![Arc::new(SimMarketSearchClient::sample())]);
        let mut raw = raw_request();
        raw.vehicle = None;

        let err = service.appraise(raw).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValuationError>(),
            Some(ValuationError::Validation(_))
        ));
    }
}
