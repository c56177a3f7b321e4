//! Vehicle decode collaborator: VIN in, decoded attributes out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::config::DecodeCfg;
use crate::core::types::DecodedVehicle;

#[async_trait]
pub trait VehicleDecodeClient: Send + Sync + 'static {
    async fn decode(&self, vin: &str) -> Result<DecodedVehicle>;
}

pub struct HttpVehicleDecodeClient {
    client: Client,
    cfg: DecodeCfg,
}

impl HttpVehicleDecodeClient {
    pub fn new(cfg: DecodeCfg, client: Client) -> Self {
        Self { client, cfg }
    }
}

#[async_trait]
impl VehicleDecodeClient for HttpVehicleDecodeClient {
    async fn decode(&self, vin: &str) -> Result<DecodedVehicle> {
        let url = format!("{}/{}", self.cfg.base_url.trim_end_matches('/'), vin);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("requesting VIN decode")?;

        if !resp.status().is_success() {
            anyhow::bail!("VIN decode failed: {}", resp.status());
        }

        resp.json::<DecodedVehicle>()
            .await
            .context("parsing VIN decode response")
    }
}
