// SPDX-License-Identifier: MIT

//! Bootstrap and balance refresh. Configure pulls listings from the
//! indexer, merges locally imported assets, and then refreshes every
//! per-account balance through batched multicall reads.

use crate::common::parsing::{decode_u256, format_bn};
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::common::parsing::lowercase_eq;
use crate::domain::model::{Asset, Gauge, Pair, RewardToken, VestLock, dedupe_assets};
use crate::infrastructure::network::abi::{IErc20, IGauge, IPair};
use crate::infrastructure::network::gateway::RawCall;
use crate::infrastructure::network::subgraph::{PairData, TokenData, UserData};
use crate::services::store::StoreContext;
use crate::services::store::events::{ActionKind, StoreEvent};
use alloy::primitives::Address;
use alloy_sol_types::SolCall;
use std::str::FromStr;
use std::sync::atomic::Ordering;

pub(crate) fn asset_from_token(token: &TokenData) -> Asset {
    Asset {
        address: token.id.clone(),
        symbol: token.symbol.clone(),
        name: token.name.clone(),
        decimals: token.decimals_u8(),
        logo_uri: None,
        balance: "0".to_string(),
        is_whitelisted: token.is_whitelisted,
        local: false,
    }
}

fn pair_from_data(data: &PairData) -> Option<Pair> {
    let address = match Address::from_str(&data.id) {
        Ok(address) => address,
        Err(_) => {
            tracing::warn!(target: "assets", pair = %data.id, "Skipping pair with invalid address");
            return None;
        }
    };
    let gauge = data.gauge.as_ref().and_then(|g| {
        let gauge_address = Address::from_str(&g.id).ok()?;
        let bribe_address = g
            .bribe
            .as_ref()
            .and_then(|b| Address::from_str(&b.id).ok())?;
        Some(Gauge {
            address: gauge_address,
            bribe_address,
            total_supply: g.total_supply.clone().unwrap_or_else(|| "0".to_string()),
            user_balance: "0".to_string(),
            reward_tokens: g
                .reward_tokens
                .iter()
                .map(|rt| RewardToken {
                    token: asset_from_token(&rt.token),
                    rewards_earned: "0".to_string(),
                })
                .collect(),
            bribes_earned: Vec::new(),
        })
    });

    Some(Pair {
        address,
        symbol: data.symbol.clone(),
        stable: data.is_stable,
        token0: asset_from_token(&data.token0),
        token1: asset_from_token(&data.token1),
        reserve0: data.reserve0.clone(),
        reserve1: data.reserve1.clone(),
        total_supply: data.total_supply.clone(),
        user_position: None,
        claimable0: "0".to_string(),
        claimable1: "0".to_string(),
        gauge,
        reward_type: None,
    })
}

/// Merge the indexer's per-user record into the freshly built pair list:
/// wallet LP balances and staked gauge balances. The balance refresh that
/// follows re-reads both on-chain; this seeds them so reward scans work
/// even when a later refresh fails.
fn enrich_positions(pairs: &mut [Pair], user: &UserData) {
    for position in &user.liquidity_positions {
        if let Some(pair) = pairs
            .iter_mut()
            .find(|pair| lowercase_eq(&format!("{:#x}", pair.address), &position.pair.id))
        {
            pair.user_position = Some(position.liquidity_token_balance.clone());
        }
    }
    for position in &user.gauge_positions {
        if let Some(pair) = pairs
            .iter_mut()
            .find(|pair| lowercase_eq(&format!("{:#x}", pair.address), &position.gauge.pair.id))
            && let Some(gauge) = &mut pair.gauge
            && !position.balance.is_empty()
        {
            gauge.user_balance = position.balance.clone();
        }
    }
}

/// Lock NFTs as the indexer reports them; `LoadLocks` later replaces them
/// with on-chain reads that carry the live voting power.
fn locks_from_user(user: &UserData) -> Vec<VestLock> {
    user.nfts
        .iter()
        .filter_map(|nft| {
            Some(VestLock {
                id: nft.id.parse().ok()?,
                lock_ends: nft.locked_end.parse().unwrap_or(0),
                lock_amount: if nft.locked_amount.is_empty() {
                    "0".to_string()
                } else {
                    nft.locked_amount.clone()
                },
                lock_value: "0".to_string(),
            })
        })
        .collect()
}

/// Full bootstrap. Ordered: governance token, vote-escrow token with its
/// distribution APR, the merged asset list, then pairs; a balance refresh
/// runs at the end. Re-entrant calls while one is in flight are dropped.
pub async fn configure(ctx: &StoreContext) -> Result<(), AppError> {
    if ctx.configuring.swap(true, Ordering::AcqRel) {
        tracing::debug!(target: "assets", "Configure already in flight");
        return Ok(());
    }
    let result = configure_inner(ctx).await;
    ctx.configuring.store(false, Ordering::Release);
    result
}

async fn configure_inner(ctx: &StoreContext) -> Result<(), AppError> {
    let gov_token = Asset {
        address: format!("{:#x}", ctx.config.gov_token),
        symbol: constants::GOV_TOKEN_SYMBOL.to_string(),
        name: constants::GOV_TOKEN_NAME.to_string(),
        decimals: constants::GOV_TOKEN_DECIMALS,
        logo_uri: None,
        balance: "0".to_string(),
        is_whitelisted: true,
        local: false,
    };
    let ve_token = Asset {
        address: format!("{:#x}", ctx.config.ve_token),
        symbol: constants::VE_TOKEN_SYMBOL.to_string(),
        name: constants::VE_TOKEN_NAME.to_string(),
        decimals: constants::VE_TOKEN_DECIMALS,
        logo_uri: None,
        balance: "0".to_string(),
        is_whitelisted: true,
        local: false,
    };
    // APR is cosmetic; a failing indexer must not block the bootstrap.
    let ve_dist_apr = match ctx.indexer.ve_dist_apr().await {
        Ok(apr) => apr,
        Err(e) => {
            tracing::warn!(target: "assets", error = %e, "Distribution APR unavailable");
            "0".to_string()
        }
    };

    let tokens = ctx.indexer.tokens().await?;
    let mut merged: Vec<Asset> = tokens.iter().map(asset_from_token).collect();
    merged.extend(ctx.local_assets.load());
    let mut base_assets = dedupe_assets(merged);
    base_assets.insert(0, Asset::native());

    let pair_data = ctx.indexer.pairs().await?;
    let mut pairs: Vec<Pair> = pair_data.iter().filter_map(pair_from_data).collect();

    // Price and the per-user record are cosmetic seeds; a failing indexer
    // query must not block the bootstrap.
    let native_price_usd = match ctx.indexer.native_price_usd().await {
        Ok(price) => price,
        Err(e) => {
            tracing::warn!(target: "assets", error = %e, "Native price unavailable");
            "0".to_string()
        }
    };
    let user_info = match ctx.indexer.user(ctx.config.account).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(target: "assets", error = %e, "User record unavailable");
            None
        }
    };
    let locks = user_info.as_ref().map(locks_from_user);
    if let Some(user) = &user_info {
        enrich_positions(&mut pairs, user);
    }

    tracing::info!(
        target: "assets",
        assets = base_assets.len(),
        pairs = pairs.len(),
        "Configured"
    );

    ctx.set_state(|s| {
        s.gov_token.asset = Some(gov_token);
        s.ve_token.asset = Some(ve_token);
        s.ve_token.ve_dist_apr = ve_dist_apr;
        s.base_assets = base_assets;
        s.pairs = pairs;
        s.native_price_usd = native_price_usd;
        if let Some(locks) = locks {
            s.locks = locks;
        }
    });
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::Configure));

    refresh_balances(ctx).await
}

/// Re-read every per-account balance: the native asset, each listed
/// ERC-20, and each pair's LP position, claimable fees and gauge stake.
pub async fn refresh_balances(ctx: &StoreContext) -> Result<(), AppError> {
    let account = ctx.config.account;
    let snapshot = ctx.state.snapshot();

    let native_balance = format_bn(
        ctx.gateway.native_balance(account).await?,
        constants::NATIVE_DECIMALS,
    );

    // Token balances, one call per listed ERC-20.
    let erc20: Vec<(usize, Address, u8)> = snapshot
        .base_assets
        .iter()
        .enumerate()
        .filter_map(|(index, asset)| {
            asset
                .evm_address()
                .map(|address| (index, address, asset.decimals))
        })
        .collect();
    let balance_calldata = |owner: Address| IErc20::balanceOfCall { owner }.abi_encode();
    let token_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &erc20, |pending, (_, address, _)| {
            pending.push(RawCall {
                target: *address,
                calldata: balance_calldata(account).into(),
            });
        })
        .await?;
    let token_balances: Vec<(usize, String)> = erc20
        .iter()
        .zip(token_results.iter())
        .map(|((index, _, decimals), raw)| (*index, format_bn(decode_u256(raw), *decimals)))
        .collect();

    // Pair reads vary in width: four calls per pair, plus two more when a
    // gauge exists, demultiplexed by a running offset.
    let pair_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &snapshot.pairs, |pending, pair| {
            pending.push(RawCall {
                target: pair.address,
                calldata: balance_calldata(account).into(),
            });
            pending.push(RawCall {
                target: pair.address,
                calldata: IPair::claimable0Call { account }.abi_encode().into(),
            });
            pending.push(RawCall {
                target: pair.address,
                calldata: IPair::claimable1Call { account }.abi_encode().into(),
            });
            pending.push(RawCall {
                target: pair.address,
                calldata: IPair::totalSupplyCall {}.abi_encode().into(),
            });
            if let Some(gauge) = &pair.gauge {
                pending.push(RawCall {
                    target: gauge.address,
                    calldata: IGauge::balanceOfCall { account }.abi_encode().into(),
                });
                pending.push(RawCall {
                    target: gauge.address,
                    calldata: IGauge::totalSupplyCall {}.abi_encode().into(),
                });
            }
        })
        .await?;

    let mut pairs = snapshot.pairs.clone();
    let mut offset = 0usize;
    for pair in &mut pairs {
        let lp_balance = decode_u256(&pair_results[offset]);
        let claimable0 = decode_u256(&pair_results[offset + 1]);
        let claimable1 = decode_u256(&pair_results[offset + 2]);
        let total_supply = decode_u256(&pair_results[offset + 3]);
        offset += 4;

        pair.user_position = Some(format_bn(lp_balance, 18));
        pair.claimable0 = format_bn(claimable0, pair.token0.decimals);
        pair.claimable1 = format_bn(claimable1, pair.token1.decimals);
        pair.total_supply = format_bn(total_supply, 18);

        if let Some(gauge) = &mut pair.gauge {
            gauge.user_balance = format_bn(decode_u256(&pair_results[offset]), 18);
            gauge.total_supply = format_bn(decode_u256(&pair_results[offset + 1]), 18);
            offset += 2;
        }
    }

    // Governance token balance rides along for the header display.
    let gov_balance_raw = ctx
        .gateway
        .call(ctx.config.gov_token, balance_calldata(account).into())
        .await?;
    let gov_balance = format_bn(
        decode_u256(&gov_balance_raw),
        constants::GOV_TOKEN_DECIMALS,
    );

    ctx.set_state(|s| {
        for asset in &mut s.base_assets {
            if asset.is_native() {
                asset.balance = native_balance.clone();
            }
        }
        for (index, balance) in &token_balances {
            if let Some(asset) = s.base_assets.get_mut(*index) {
                asset.balance = balance.clone();
            }
        }
        s.pairs = pairs;
        if let Some(gov) = &mut s.gov_token.asset {
            gov.balance = gov_balance.clone();
        }
    });
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::RefreshBalances));
    Ok(())
}

/// Persist a user-imported asset and splice it into the listing.
pub async fn add_local(ctx: &StoreContext, asset: Asset) -> Result<(), AppError> {
    if asset.evm_address().is_none() {
        return Err(AppError::InvalidAddress(asset.address));
    }
    ctx.local_assets.add(asset.clone())?;

    ctx.set_state(|s| {
        let mut merged = std::mem::take(&mut s.base_assets);
        let mut added = asset;
        added.local = true;
        merged.push(added);
        s.base_assets = dedupe_assets(merged);
    });
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::AddLocalAsset));
    refresh_balances(ctx).await
}

pub async fn remove_local(ctx: &StoreContext, address: &str) -> Result<(), AppError> {
    ctx.local_assets.remove(address)?;
    ctx.set_state(|s| {
        s.base_assets
            .retain(|asset| !(asset.local && asset.same_address(address)));
    });
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::RemoveLocalAsset));
    Ok(())
}
