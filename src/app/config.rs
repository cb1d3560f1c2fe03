// SPDX-License-Identifier: MIT

use crate::domain::constants;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_chain")]
    pub chain_id: u64,

    // Endpoints
    pub http_provider: Option<String>,
    pub subgraph_url: Option<String>,

    // Identity
    pub account_address: Address,
    pub wallet_key: Option<String>,

    // Transaction tuning
    /// Fixed gas price in gwei; `None` lets the node quote one.
    pub gas_price_gwei: Option<u64>,
    #[serde(default = "default_multicall_ceiling")]
    pub multicall_batch_ceiling: usize,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    // Protocol contract overrides (BSC mainnet defaults apply when unset)
    pub router_address: Option<Address>,
    pub voter_address: Option<Address>,
    pub ve_dist_address: Option<Address>,
    pub multicall_address: Option<Address>,

    // Local asset persistence
    pub local_assets_path: Option<String>,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_chain() -> u64 {
    constants::CHAIN_BSC
}
fn default_multicall_ceiling() -> usize {
    constants::MULTICALL_BATCH_CEILING
}
fn default_receipt_poll_ms() -> u64 {
    500
}
fn default_receipt_timeout_ms() -> u64 {
    120_000
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > profile file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;

        if settings.account_address == Address::ZERO {
            return Err(AppError::Config("ACCOUNT_ADDRESS is missing".to_string()));
        }

        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn http_provider(&self) -> Result<String, AppError> {
        if let Some(url) = &self.http_provider
            && !url.trim().is_empty()
        {
            return Ok(url.trim().to_string());
        }
        let candidates = [
            format!("http_provider_{}", self.chain_id),
            "http_provider".to_string(),
        ];
        for key in candidates {
            if let Ok(v) = std::env::var(&key) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Ok(trimmed.to_string());
                }
            }
        }
        Err(AppError::Config(format!(
            "No RPC URL found for chain {}",
            self.chain_id
        )))
    }

    pub fn subgraph_url(&self) -> Result<String, AppError> {
        if let Some(url) = &self.subgraph_url
            && !url.trim().is_empty()
        {
            return Ok(url.trim().to_string());
        }
        if let Ok(v) = std::env::var("SUBGRAPH_URL")
            && !v.trim().is_empty()
        {
            return Ok(v.trim().to_string());
        }
        Err(AppError::Config("No subgraph URL configured".to_string()))
    }

    pub fn router_address(&self) -> Address {
        self.router_address.unwrap_or(constants::ROUTER)
    }

    pub fn voter_address(&self) -> Address {
        self.voter_address.unwrap_or(constants::VOTER)
    }

    pub fn ve_dist_address(&self) -> Address {
        self.ve_dist_address.unwrap_or(constants::VE_DIST)
    }

    pub fn multicall_address(&self) -> Address {
        self.multicall_address.unwrap_or(constants::MULTICALL)
    }

    pub fn multicall_batch_ceiling_value(&self) -> usize {
        self.multicall_batch_ceiling.max(1)
    }

    pub fn receipt_poll_ms_value(&self) -> u64 {
        self.receipt_poll_ms.max(100)
    }

    pub fn receipt_timeout_ms_value(&self) -> u64 {
        self.receipt_timeout_ms.max(self.receipt_poll_ms_value())
    }

    pub fn local_assets_path_value(&self) -> String {
        std::env::var("LOCAL_ASSETS_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| self.local_assets_path.clone())
            .unwrap_or_else(|| "data/local_assets.json".to_string())
    }

    pub fn wallet_key_value(&self) -> Result<String, AppError> {
        if let Ok(v) = std::env::var("WALLET_KEY")
            && !v.trim().is_empty()
        {
            return Ok(v.trim().to_string());
        }
        self.wallet_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Config("WALLET_KEY is missing".to_string()))
    }
}
