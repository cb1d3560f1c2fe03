// SPDX-License-Identifier: MIT

use crate::domain::constants::{GAS_MARGIN_DEN, GAS_MARGIN_NUM, WEI_PER_GWEI};
use crate::domain::error::{AppError, GatewayError};
use crate::infrastructure::network::gateway::{CallSpec, ChainGateway};
use crate::services::tx::batch::TxQueue;
use std::sync::Arc;
use uuid::Uuid;

/// Drives one staged step through estimate, submit and mine, reporting
/// progress on the queue.
///
/// Providers that answer a submission- or mining-phase request with a
/// structured "method not found" are tolerated: the step is left as-is and
/// the pipeline reports no hash instead of failing, since an injected
/// wallet may be driving the transaction through its own channel.
/// Estimation failures are never tolerated; a transaction that cannot be
/// estimated must not reach the wire.
pub struct TxLifecycle {
    gateway: Arc<dyn ChainGateway>,
    gas_price_gwei: Option<u64>,
}

impl TxLifecycle {
    pub fn new(gateway: Arc<dyn ChainGateway>, gas_price_gwei: Option<u64>) -> Self {
        Self {
            gateway,
            gas_price_gwei,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn ChainGateway> {
        &self.gateway
    }

    /// Returns the confirmed transaction hash, or `None` when the provider
    /// declined a post-estimation method and progress is unknowable.
    pub async fn execute(
        &self,
        queue: &TxQueue,
        id: Uuid,
        spec: CallSpec,
    ) -> Result<Option<String>, AppError> {
        queue.pending(id);

        let estimate = match self.gateway.estimate_gas(&spec).await {
            Ok(gas) => gas,
            Err(e) => {
                tracing::warn!(target: "tx", %id, error = %e, "Gas estimation failed");
                queue.rejected(id, "Error estimating gas");
                return Err(AppError::Transaction {
                    hash: None,
                    reason: "Error estimating gas".to_string(),
                });
            }
        };
        let gas_limit = estimate.saturating_mul(GAS_MARGIN_NUM) / GAS_MARGIN_DEN;
        let gas_price_wei = self.gas_price_gwei.map(|g| g as u128 * WEI_PER_GWEI);

        let hash = match self
            .gateway
            .send_transaction(&spec, gas_limit, gas_price_wei)
            .await
        {
            Ok(hash) => hash,
            Err(GatewayError::UnsupportedMethod) => {
                tracing::debug!(target: "tx", %id, "Provider declined submission method");
                return Ok(None);
            }
            Err(e) => {
                let reason = e.reason();
                queue.rejected(id, &reason);
                return Err(AppError::Transaction { hash: None, reason });
            }
        };
        let hash_str = format!("{:#x}", hash);
        queue.submitted(id, &hash_str);

        match self.gateway.wait_for_receipt(hash).await {
            Ok(true) => {
                queue.confirmed(id, &hash_str);
                Ok(Some(hash_str))
            }
            Ok(false) => {
                queue.rejected(id, "Transaction reverted");
                Err(AppError::Transaction {
                    hash: Some(hash_str),
                    reason: "Transaction reverted".to_string(),
                })
            }
            Err(GatewayError::UnsupportedMethod) => {
                tracing::debug!(target: "tx", %id, "Provider declined receipt method");
                Ok(None)
            }
            Err(e) => {
                let reason = e.reason();
                queue.rejected(id, &reason);
                Err(AppError::Transaction {
                    hash: Some(hash_str),
                    reason,
                })
            }
        }
    }
}
