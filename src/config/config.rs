use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppCfg {
    #[serde(default)]
    pub http: HttpCfg,
    #[serde(default)]
    pub market: MarketCfg,
    #[serde(default)]
    pub decode: DecodeCfg,
    #[serde(default)]
    pub cache: CacheCfg,
    #[serde(default)]
    pub database: DatabaseCfg,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpCfg {
    #[serde(rename = "userAgent", default = "default_ua")]
    pub user_agent: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(rename = "poolIdleTimeout", with = "humantime_serde", default = "default_pool_idle")]
    pub pool_idle_timeout: Duration,
    #[serde(rename = "poolMaxIdlePerHost", default = "default_pool")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            user_agent: default_ua(),
            timeout: default_timeout(),
            pool_idle_timeout: default_pool_idle(),
            pool_max_idle_per_host: default_pool(),
        }
    }
}
fn default_ua() -> String {
    "autoval/0.1".into()
}
fn default_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_pool_idle() -> Duration {
    Duration::from_secs(90)
}
fn default_pool() -> usize {
    16
}

/// One HTTP market source endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct MarketSourceCfg {
    pub id: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketCfg {
    #[serde(default)]
    pub sources: Vec<MarketSourceCfg>,
    /// Use the deterministic in-process simulator instead of HTTP sources.
    #[serde(default)]
    pub simulate: bool,
    #[serde(rename = "searchTimeout", with = "humantime_serde", default = "default_search_timeout")]
    pub search_timeout: Duration,
    #[serde(rename = "radiusMiles", default = "default_radius")]
    pub radius_miles: u32,
}

impl Default for MarketCfg {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            simulate: true,
            search_timeout: default_search_timeout(),
            radius_miles: default_radius(),
        }
    }
}
fn default_search_timeout() -> Duration {
    Duration::from_secs(8)
}
fn default_radius() -> u32 {
    100
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DecodeCfg {
    /// Empty disables the decode collaborator; requests must then carry
    /// decoded vehicle attributes themselves.
    #[serde(rename = "baseUrl", default)]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheCfg {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(with = "humantime_serde", default = "default_cache_ttl")]
    pub ttl: Duration,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl: default_cache_ttl(),
        }
    }
}
fn default_cache_capacity() -> usize {
    256
}
fn default_cache_ttl() -> Duration {
    Duration::from_secs(600)
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseCfg {
    /// Empty disables persistence.
    #[serde(default)]
    pub url: String,
}

impl AppCfg {
    pub fn load(path: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(path))
            .add_source(config::Environment::default().separator("__"))
            .build()
            .context("building config")?;

        let app: AppCfg = cfg.try_deserialize().context("deserializing config")?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.market.simulate || !self.market.sources.is_empty(),
            "market.sources must not be empty when market.simulate is off"
        );
        anyhow::ensure!(self.market.radius_miles > 0, "market.radiusMiles must be > 0");
        anyhow::ensure!(self.cache.capacity > 0, "cache.capacity must be > 0");
        for source in &self.market.sources {
            anyhow::ensure!(
                !source.id.trim().is_empty() && !source.base_url.trim().is_empty(),
                "market source entries need both id and baseUrl"
            );
        }
        Ok(())
    }
}
