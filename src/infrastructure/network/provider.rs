// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use alloy::network::{Ethereum, EthereumWallet};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use url::Url;

pub type SignerProvider = DynProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Provider with a signing wallet attached; required to submit
    /// transactions.
    pub fn http_with_signer(rpc_url: &str, wallet_key: &str) -> Result<SignerProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        let signer = PrivateKeySigner::from_str(wallet_key.trim())
            .map_err(|e| AppError::Config(format!("Invalid wallet key: {}", e)))?;
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);
        Ok(provider.erased())
    }
}
