// SPDX-License-Identifier: MIT

use crate::common::parsing::{is_positive, lowercase_eq};
use crate::domain::constants;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A tradable token. Identity is the address, compared case-insensitively;
/// the chain-native asset uses the `constants::NATIVE_ADDRESS` placeholder
/// and has no ERC-20 contract behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default)]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub is_whitelisted: bool,
    /// User-added assets survive reloads via the local asset store.
    #[serde(default)]
    pub local: bool,
}

impl Asset {
    pub fn native() -> Self {
        Asset {
            address: constants::NATIVE_ADDRESS.to_string(),
            symbol: constants::NATIVE_SYMBOL.to_string(),
            name: constants::NATIVE_NAME.to_string(),
            decimals: constants::NATIVE_DECIMALS,
            logo_uri: None,
            balance: "0".to_string(),
            is_whitelisted: true,
            local: false,
        }
    }

    pub fn is_native(&self) -> bool {
        self.address == constants::NATIVE_ADDRESS
    }

    /// ERC-20 contract address, `None` for the native placeholder.
    pub fn evm_address(&self) -> Option<Address> {
        if self.is_native() {
            return None;
        }
        Address::from_str(&self.address).ok()
    }

    pub fn same_address(&self, other: &str) -> bool {
        lowercase_eq(&self.address, other)
    }
}

/// Drop later duplicates of the same (case-insensitive) address,
/// keeping first occurrence order.
pub fn dedupe_assets(assets: Vec<Asset>) -> Vec<Asset> {
    let mut seen: Vec<String> = Vec::with_capacity(assets.len());
    let mut out = Vec::with_capacity(assets.len());
    for asset in assets {
        let key = asset.address.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(asset);
    }
    out
}

/// One emission-reward token configured on a gauge.
#[derive(Debug, Clone)]
pub struct RewardToken {
    pub token: Asset,
    pub rewards_earned: String,
}

/// One bribe token with a claimable balance for a given lock.
#[derive(Debug, Clone)]
pub struct BribeEarned {
    pub token: Asset,
    pub earned: String,
}

#[derive(Debug, Clone)]
pub struct Gauge {
    pub address: Address,
    pub bribe_address: Address,
    pub total_supply: String,
    pub user_balance: String,
    pub reward_tokens: Vec<RewardToken>,
    pub bribes_earned: Vec<BribeEarned>,
}

/// A liquidity pool between two assets. `gauge` is absent for pairs that
/// cannot earn emission rewards. Reserves and claimables are refreshed in
/// place, never historically retained.
#[derive(Debug, Clone)]
pub struct Pair {
    pub address: Address,
    pub symbol: String,
    pub stable: bool,
    pub token0: Asset,
    pub token1: Asset,
    pub reserve0: String,
    pub reserve1: String,
    pub total_supply: String,
    /// The account's LP token balance, when the indexer reports a position.
    pub user_position: Option<String>,
    pub claimable0: String,
    pub claimable1: String,
    pub gauge: Option<Gauge>,
    /// Category tag set while the pair sits inside a reward bundle.
    pub reward_type: Option<RewardType>,
}

impl Pair {
    /// A position is either LP tokens in the wallet or a staked gauge
    /// balance; both make the pair eligible for fee and reward scans.
    pub fn has_position(&self) -> bool {
        self.user_position.as_deref().map(is_positive).unwrap_or(false)
            || self
                .gauge
                .as_ref()
                .is_some_and(|gauge| is_positive(&gauge.user_balance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardType {
    Bribe,
    Fees,
    Reward,
    Distribution,
}

/// A vote-escrow lock NFT.
#[derive(Debug, Clone, PartialEq)]
pub struct VestLock {
    pub id: u64,
    pub lock_ends: u64,
    pub lock_amount: String,
    pub lock_value: String,
}

/// Derived vote weight for one pool; recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub pool_address: Address,
    pub vote_percent: String,
}

/// Vote as submitted by the user: percent in -100..=100, zero meaning
/// "no vote" (filtered before the contract call).
#[derive(Debug, Clone)]
pub struct VoteInput {
    pub pool_address: Address,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct DistributionClaim {
    pub lock: VestLock,
    pub reward_token: Asset,
    pub earned: String,
}

/// Point-in-time snapshot of claimable value across the four reward
/// categories. Replaced wholesale on every refresh. Categories are
/// independent tagged lists: a pair may legitimately appear in more than
/// one with different `reward_type` tags.
#[derive(Debug, Clone, Default)]
pub struct RewardBundle {
    pub bribes: Vec<Pair>,
    pub fees: Vec<Pair>,
    pub rewards: Vec<Pair>,
    pub ve_dist: Vec<DistributionClaim>,
}

impl RewardBundle {
    pub fn is_empty(&self) -> bool {
        self.bribes.is_empty()
            && self.fees.is_empty()
            && self.rewards.is_empty()
            && self.ve_dist.is_empty()
    }
}

/// One hop of a router swap path.
#[derive(Debug, Clone)]
pub struct SwapRoute {
    pub from: Address,
    pub to: Address,
    pub stable: bool,
}

#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub amount_in: String,
    /// Quoted output before slippage.
    pub expected_out: String,
    pub slippage_percent: String,
    pub routes: Vec<SwapRoute>,
    /// Fee-on-transfer tokens need the tax-tolerant router entrypoints.
    pub fee_on_transfer: bool,
}
