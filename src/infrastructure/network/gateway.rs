// SPDX-License-Identifier: MIT

use crate::domain::error::{GatewayError, JSONRPC_METHOD_NOT_FOUND};
use crate::infrastructure::network::abi::{Call as AggregateCall, IMulticall};
use crate::infrastructure::network::provider::SignerProvider;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{RpcError, TransportErrorKind};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::time::Duration;

/// One read-only call inside a multicall batch.
#[derive(Debug, Clone)]
pub struct RawCall {
    pub target: Address,
    pub calldata: Bytes,
}

/// A state-changing call ready for estimation and submission.
#[derive(Debug, Clone)]
pub struct CallSpec {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl CallSpec {
    pub fn new(to: Address, data: Bytes) -> Self {
        CallSpec {
            to,
            data,
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Thin RPC seam. Everything above this trait is deterministic and
/// testable against an in-memory implementation.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, GatewayError>;

    /// Execute all `calls` in one `aggregate` round trip, returning the
    /// raw return data in call order.
    async fn multicall(&self, calls: &[RawCall]) -> Result<Vec<Bytes>, GatewayError>;

    async fn estimate_gas(&self, spec: &CallSpec) -> Result<u64, GatewayError>;

    /// Submit a signed transaction and return its hash without waiting
    /// for inclusion.
    async fn send_transaction(
        &self,
        spec: &CallSpec,
        gas_limit: u64,
        gas_price_wei: Option<u128>,
    ) -> Result<B256, GatewayError>;

    /// Poll until the transaction is mined; `true` when it succeeded.
    async fn wait_for_receipt(&self, hash: B256) -> Result<bool, GatewayError>;

    async fn native_balance(&self, owner: Address) -> Result<U256, GatewayError>;
}

/// Classify a JSON-RPC failure. The -32601 code maps to
/// `UnsupportedMethod` only when it arrives as the structured error code;
/// a message that merely mentions the number stays a plain RPC error.
pub(crate) fn classify_rpc(code: Option<i64>, message: &str) -> GatewayError {
    if code == Some(JSONRPC_METHOD_NOT_FOUND) {
        return GatewayError::UnsupportedMethod;
    }
    if let Some(pos) = message.find("execution reverted") {
        let remainder = message[pos + "execution reverted".len()..]
            .trim_start_matches(':')
            .trim();
        let reason = if remainder.is_empty() {
            "execution reverted".to_string()
        } else {
            remainder.to_string()
        };
        return GatewayError::Revert(reason);
    }
    GatewayError::Rpc(message.to_string())
}

fn classify_transport(err: RpcError<TransportErrorKind>) -> GatewayError {
    match err.as_error_resp() {
        Some(payload) => classify_rpc(Some(payload.code), &payload.message),
        None => GatewayError::Rpc(err.to_string()),
    }
}

/// Production gateway backed by an alloy provider with a wallet filler.
pub struct AlloyGateway {
    provider: SignerProvider,
    from: Address,
    multicall_address: Address,
    receipt_poll: Duration,
    receipt_timeout: Duration,
}

impl AlloyGateway {
    pub fn new(
        provider: SignerProvider,
        from: Address,
        multicall_address: Address,
        receipt_poll: Duration,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            from,
            multicall_address,
            receipt_poll,
            receipt_timeout,
        }
    }

    fn request(&self, spec: &CallSpec) -> TransactionRequest {
        let mut tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(spec.to)
            .with_input(spec.data.clone());
        if spec.value > U256::ZERO {
            tx = tx.with_value(spec.value);
        }
        tx
    }
}

#[async_trait]
impl ChainGateway for AlloyGateway {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, GatewayError> {
        let tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(to)
            .with_input(data);
        self.provider.call(tx).await.map_err(classify_transport)
    }

    async fn multicall(&self, calls: &[RawCall]) -> Result<Vec<Bytes>, GatewayError> {
        let aggregate = IMulticall::aggregateCall {
            calls: calls
                .iter()
                .map(|c| AggregateCall {
                    target: c.target,
                    callData: c.calldata.clone(),
                })
                .collect(),
        };
        let raw = self
            .call(self.multicall_address, aggregate.abi_encode().into())
            .await?;
        let decoded = IMulticall::aggregateCall::abi_decode_returns(&raw)
            .map_err(|e| GatewayError::Rpc(format!("multicall decode failed: {}", e)))?;
        Ok(decoded.returnData)
    }

    async fn estimate_gas(&self, spec: &CallSpec) -> Result<u64, GatewayError> {
        self.provider
            .estimate_gas(self.request(spec))
            .await
            .map_err(classify_transport)
    }

    async fn send_transaction(
        &self,
        spec: &CallSpec,
        gas_limit: u64,
        gas_price_wei: Option<u128>,
    ) -> Result<B256, GatewayError> {
        let mut tx = self.request(spec).with_gas_limit(gas_limit);
        if let Some(price) = gas_price_wei {
            tx = tx.with_gas_price(price);
        }
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(classify_transport)?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<bool, GatewayError> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;
        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt.status()),
                Ok(None) => {}
                Err(e) => return Err(classify_transport(e)),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(GatewayError::Rpc(format!(
                    "timed out waiting for receipt of {:#x}",
                    hash
                )));
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(classify_transport)
    }
}
