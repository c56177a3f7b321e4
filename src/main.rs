use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, info_span};

use autoval::cache::{NoopValuationCache, TtlValuationCache, ValuationCache};
use autoval::config::config::AppCfg;
use autoval::core::error::ValuationError;
use autoval::core::types::RawValuationRequest;
use autoval::decode::client::{HttpVehicleDecodeClient, VehicleDecodeClient};
use autoval::market::aggregator::MarketSearchAggregator;
use autoval::market::client::MarketSearchClient;
use autoval::market::http::HttpMarketSearchClient;
use autoval::market::simulator::SimMarketSearchClient;
use autoval::persistence::database::Database;
use autoval::service::valuation_service::ValuationService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let request_path = std::env::args()
        .nth(1)
        .context("usage: autoval <request.json> [config.yml]")?;
    let config_path = std::env::args().nth(2).unwrap_or_else(|| "config.yml".to_string());

    let cfg = AppCfg::load(&config_path)?;

    let span = info_span!(
        "Valuation",
        pid = %std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
    );
    let _enter = span.enter();

    info!("Initializing HTTP client");
    let client = Client::builder()
        .user_agent(cfg.http.user_agent.clone())
        .pool_idle_timeout(cfg.http.pool_idle_timeout)
        .pool_max_idle_per_host(cfg.http.pool_max_idle_per_host)
        .timeout(cfg.http.timeout)
        .build()
        .context("building HTTP client")?;

    info!("Building market sources");
    let sources: Vec<Arc<dyn MarketSearchClient>> = if cfg.market.simulate {
        vec![Arc::new(SimMarketSearchClient::sample())]
    } else {
        cfg.market
            .sources
            .iter()
            .map(|source| {
                Arc::new(HttpMarketSearchClient::new(source.clone(), client.clone()))
                    as Arc<dyn MarketSearchClient>
            })
            .collect()
    };
    let aggregator = MarketSearchAggregator::new(sources, cfg.market.search_timeout);

    let decoder: Option<Arc<dyn VehicleDecodeClient>> = if cfg.decode.base_url.is_empty() {
        None
    } else {
        Some(Arc::new(HttpVehicleDecodeClient::new(
            cfg.decode.clone(),
            client.clone(),
        )))
    };

    let cache: Arc<dyn ValuationCache> = if cfg.cache.ttl.is_zero() {
        Arc::new(NoopValuationCache)
    } else {
        Arc::new(TtlValuationCache::new(cfg.cache.capacity, cfg.cache.ttl))
    };

    let store = if cfg.database.url.is_empty() {
        info!("Persistence disabled (no database.url)");
        None
    } else {
        info!("Connecting valuation store");
        Some(Database::new(&cfg.database.url).await?)
    };

    let service = ValuationService::new(
        aggregator,
        decoder,
        cache,
        store,
        cfg.market.radius_miles,
    );

    info!(path = %request_path, "Reading valuation request");
    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("reading {request_path}"))?;
    let request: RawValuationRequest =
        serde_json::from_str(&raw).context("parsing valuation request")?;

    match service.appraise(request).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            println!();
            println!("{}", result.explanation);
            Ok(())
        }
        Err(e) => {
            if let Some(ValuationError::Validation(issues)) = e.downcast_ref::<ValuationError>() {
                eprintln!("Request rejected:");
                for issue in issues {
                    eprintln!("  - {issue}");
                }
            }
            Err(e)
        }
    }
}
