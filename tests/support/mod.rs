// SPDX-License-Identifier: MIT
// Shared in-memory doubles for integration tests: a scripted chain gateway
// and a canned indexer, plus wiring for a store context that never touches
// a real RPC endpoint.
#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use vedex::domain::error::{AppError, GatewayError};
use vedex::infrastructure::network::gateway::{CallSpec, ChainGateway, RawCall};
use vedex::infrastructure::network::subgraph::{Indexer, PairData, TokenData, UserData};
use vedex::services::store::{StoreConfig, StoreContext};
use vedex::services::store::events::StoreEvent;

#[derive(Debug, Clone)]
pub struct SentTx {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price_wei: Option<u128>,
}

/// Scripted gateway. Read responses are routed by (target, selector);
/// anything unscripted answers a zero word, which decodes as 0 / empty.
#[derive(Default)]
pub struct MockGateway {
    responses: Mutex<HashMap<(Address, [u8; 4]), Bytes>>,
    pub sent: Mutex<Vec<SentTx>>,
    pub batch_sizes: Mutex<Vec<usize>>,
    pub estimate_error: Mutex<Option<GatewayError>>,
    pub send_error: Mutex<Option<GatewayError>>,
    pub receipt_error: Mutex<Option<GatewayError>>,
    pub receipt_success: Mutex<bool>,
    pub native_balance: Mutex<U256>,
    /// When set, every read parks on the semaphore until permits arrive;
    /// lets a test hold an operation mid-flight.
    pub gate: Mutex<Option<std::sync::Arc<tokio::sync::Semaphore>>>,
    hash_counter: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        let gw = Self::default();
        *gw.receipt_success.lock().unwrap() = true;
        gw
    }

    pub fn script(&self, target: Address, selector: [u8; 4], response: Bytes) {
        self.responses
            .lock()
            .unwrap()
            .insert((target, selector), response);
    }

    pub fn script_u256(&self, target: Address, selector: [u8; 4], value: U256) {
        self.script(target, selector, value.abi_encode().into());
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
    }

    fn answer(&self, target: Address, data: &[u8]) -> Bytes {
        let mut selector = [0u8; 4];
        if data.len() >= 4 {
            selector.copy_from_slice(&data[..4]);
        }
        self.responses
            .lock()
            .unwrap()
            .get(&(target, selector))
            .cloned()
            .unwrap_or_else(|| U256::ZERO.abi_encode().into())
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, GatewayError> {
        self.pass_gate().await;
        Ok(self.answer(to, &data))
    }

    async fn multicall(&self, calls: &[RawCall]) -> Result<Vec<Bytes>, GatewayError> {
        self.pass_gate().await;
        self.batch_sizes.lock().unwrap().push(calls.len());
        Ok(calls
            .iter()
            .map(|call| self.answer(call.target, &call.calldata))
            .collect())
    }

    async fn estimate_gas(&self, _spec: &CallSpec) -> Result<u64, GatewayError> {
        if let Some(error) = self.estimate_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(100_000)
    }

    async fn send_transaction(
        &self,
        spec: &CallSpec,
        gas_limit: u64,
        gas_price_wei: Option<u128>,
    ) -> Result<B256, GatewayError> {
        if let Some(error) = self.send_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent.lock().unwrap().push(SentTx {
            to: spec.to,
            data: spec.data.clone(),
            value: spec.value,
            gas_limit,
            gas_price_wei,
        });
        let counter = self.hash_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let mut raw = [0u8; 32];
        raw[24..].copy_from_slice(&counter.to_be_bytes());
        Ok(B256::from(raw))
    }

    async fn wait_for_receipt(&self, _hash: B256) -> Result<bool, GatewayError> {
        if let Some(error) = self.receipt_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(*self.receipt_success.lock().unwrap())
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256, GatewayError> {
        self.pass_gate().await;
        Ok(*self.native_balance.lock().unwrap())
    }
}

/// Canned indexer responses.
#[derive(Default)]
pub struct MockIndexer {
    pub pairs: Vec<PairData>,
    pub tokens: Vec<TokenData>,
    pub apr: String,
    pub user: Option<UserData>,
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn pairs(&self) -> Result<Vec<PairData>, AppError> {
        Ok(self.pairs.clone())
    }

    async fn tokens(&self) -> Result<Vec<TokenData>, AppError> {
        Ok(self.tokens.clone())
    }

    async fn native_price_usd(&self) -> Result<String, AppError> {
        Ok("300.0".to_string())
    }

    async fn ve_dist_apr(&self) -> Result<String, AppError> {
        if self.apr.is_empty() {
            Ok("0".to_string())
        } else {
            Ok(self.apr.clone())
        }
    }

    async fn user(&self, _account: Address) -> Result<Option<UserData>, AppError> {
        Ok(self.user.clone())
    }
}

pub fn token_data(address: &str, symbol: &str, decimals: &str) -> TokenData {
    serde_json::from_str(&format!(
        r#"{{"id":"{address}","symbol":"{symbol}","name":"{symbol}","decimals":"{decimals}","isWhitelisted":true}}"#
    ))
    .expect("token payload")
}

pub fn pair_data(address: &str, symbol: &str, gauge: Option<(&str, &str)>) -> PairData {
    let gauge_json = match gauge {
        Some((gauge_address, bribe_address)) => format!(
            r#","gauge":{{"id":"{gauge_address}","totalSupply":"0","bribe":{{"id":"{bribe_address}"}}}}"#
        ),
        None => String::new(),
    };
    serde_json::from_str(&format!(
        r#"{{
            "id":"{address}",
            "symbol":"{symbol}",
            "isStable":false,
            "token0":{{"id":"0x00000000000000000000000000000000000000a0","symbol":"T0","name":"T0","decimals":"18"}},
            "token1":{{"id":"0x00000000000000000000000000000000000000b0","symbol":"T1","name":"T1","decimals":"18"}},
            "reserve0":"1","reserve1":"1","totalSupply":"1"{gauge_json}
        }}"#
    ))
    .expect("pair payload")
}

pub fn user_data(raw: &str) -> UserData {
    serde_json::from_str(raw).expect("user payload")
}

pub fn test_config(account: Address) -> StoreConfig {
    StoreConfig {
        account,
        router: Address::repeat_byte(0x01),
        voter: Address::repeat_byte(0x02),
        ve_dist: Address::repeat_byte(0x03),
        wrapped_native: Address::repeat_byte(0x04),
        gov_token: Address::repeat_byte(0x05),
        ve_token: Address::repeat_byte(0x06),
        gas_price_gwei: Some(5),
        multicall_ceiling: 30,
        local_assets_path: std::env::temp_dir()
            .join(format!(
                "vedex-test-assets-{}-{}.json",
                std::process::id(),
                uuid::Uuid::new_v4()
            ))
            .to_string_lossy()
            .to_string(),
    }
}

pub fn context(
    config: StoreConfig,
    gateway: std::sync::Arc<MockGateway>,
    indexer: MockIndexer,
) -> std::sync::Arc<StoreContext> {
    StoreContext::new(config, gateway, std::sync::Arc::new(indexer))
}

/// Drain everything currently buffered on an event receiver.
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
