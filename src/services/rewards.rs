// SPDX-License-Identifier: MIT

//! Claimable-value aggregation and claiming. The bundle spans four
//! categories: voting bribes, accrued swap fees, gauge emission rewards,
//! and the rebase distribution tied to a lock. Each category is read with
//! batched multicalls and only entries with a positive claimable amount
//! survive into the bundle.

use crate::common::parsing::{decode_u256, format_bn, lowercase_eq};
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::model::{
    Asset, BribeEarned, DistributionClaim, Gauge, Pair, RewardBundle, RewardToken, RewardType,
};
use crate::infrastructure::network::abi::{IBribe, IErc20, IGauge, IPair, IVeDist, IVoter};
use crate::infrastructure::network::gateway::{CallSpec, RawCall};
use crate::services::assets;
use crate::services::store::StoreContext;
use crate::services::store::events::{ActionKind, StoreEvent};
use crate::services::store::state::StateSnapshot;
use crate::services::tx::batch::TxQueue;
use alloy::primitives::{Address, U256};
use alloy_sol_types::SolCall;
use std::str::FromStr;
use std::sync::atomic::Ordering;

fn gov_asset(ctx: &StoreContext, snapshot: &StateSnapshot) -> Asset {
    snapshot.gov_token.asset.clone().unwrap_or_else(|| Asset {
        address: format!("{:#x}", ctx.config.gov_token),
        symbol: constants::GOV_TOKEN_SYMBOL.to_string(),
        name: constants::GOV_TOKEN_NAME.to_string(),
        decimals: constants::GOV_TOKEN_DECIMALS,
        logo_uri: None,
        balance: "0".to_string(),
        is_whitelisted: true,
        local: false,
    })
}

/// Rebuild the reward bundle for `token_id`. Re-entrant calls while a
/// collection is already running are dropped.
pub async fn collect(ctx: &StoreContext, token_id: u64) -> Result<(), AppError> {
    if ctx.rewards_loading.swap(true, Ordering::AcqRel) {
        tracing::debug!(target: "rewards", "Collection already in flight");
        return Ok(());
    }
    let result = collect_inner(ctx, token_id).await;
    ctx.rewards_loading.store(false, Ordering::Release);
    result
}

async fn collect_inner(ctx: &StoreContext, token_id: u64) -> Result<(), AppError> {
    let snapshot = ctx.state.snapshot();

    let (ve_dist, bribes, fees, rewards) = tokio::join!(
        distribution_claims(ctx, &snapshot, token_id),
        bribe_claims(ctx, &snapshot, token_id),
        fee_claims(ctx, &snapshot),
        gauge_claims(ctx, &snapshot),
    );

    let bundle = RewardBundle {
        bribes: bribes?,
        fees: fees?,
        rewards: rewards?,
        ve_dist: ve_dist?,
    };
    tracing::info!(
        target: "rewards",
        token_id,
        bribes = bundle.bribes.len(),
        fees = bundle.fees.len(),
        rewards = bundle.rewards.len(),
        distributions = bundle.ve_dist.len(),
        "Reward bundle rebuilt"
    );

    ctx.set_state(|s| s.rewards = bundle);
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::CollectRewards));
    Ok(())
}

async fn distribution_claims(
    ctx: &StoreContext,
    snapshot: &StateSnapshot,
    token_id: u64,
) -> Result<Vec<DistributionClaim>, AppError> {
    // The whole wallet's locks are checked, not only the selected one,
    // so the UI can offer every claim at once.
    let _ = token_id;
    let results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &snapshot.locks, |pending, lock| {
            pending.push(RawCall {
                target: ctx.config.ve_dist,
                calldata: IVeDist::claimableCall {
                    tokenId: U256::from(lock.id),
                }
                .abi_encode()
                .into(),
            });
        })
        .await?;

    let gov = gov_asset(ctx, snapshot);
    Ok(snapshot
        .locks
        .iter()
        .zip(results.iter())
        .filter_map(|(lock, raw)| {
            let claimable = decode_u256(raw);
            (claimable > U256::ZERO).then(|| DistributionClaim {
                lock: lock.clone(),
                reward_token: gov.clone(),
                earned: format_bn(claimable, gov.decimals),
            })
        })
        .collect())
}

async fn gauge_claims(
    ctx: &StoreContext,
    snapshot: &StateSnapshot,
) -> Result<Vec<Pair>, AppError> {
    let account = ctx.config.account;
    let gov = gov_asset(ctx, snapshot);

    // Only pairs the account holds a position in are scanned, one earned
    // read per configured emission token; gauges that list none fall back
    // to the governance token.
    let candidates: Vec<(&Pair, Address, Vec<(Asset, Address)>)> = snapshot
        .pairs
        .iter()
        .filter(|pair| pair.has_position())
        .filter_map(|pair| {
            let gauge = pair.gauge.as_ref()?;
            let mut tokens: Vec<(Asset, Address)> = gauge
                .reward_tokens
                .iter()
                .filter_map(|rt| {
                    rt.token
                        .evm_address()
                        .map(|address| (rt.token.clone(), address))
                })
                .collect();
            if tokens.is_empty() {
                tokens.push((gov.clone(), ctx.config.gov_token));
            }
            Some((pair, gauge.address, tokens))
        })
        .collect();

    let results = ctx
        .reader
        .read(
            ctx.gateway.as_ref(),
            &candidates,
            |pending, (_, gauge, tokens)| {
                for (_, token) in tokens {
                    pending.push(RawCall {
                        target: *gauge,
                        calldata: IGauge::earnedCall {
                            token: *token,
                            account,
                        }
                        .abi_encode()
                        .into(),
                    });
                }
            },
        )
        .await?;

    let mut out = Vec::new();
    let mut offset = 0usize;
    for (pair, _, tokens) in &candidates {
        let mut earned_tokens: Vec<RewardToken> = Vec::new();
        for (asset, _) in tokens {
            let earned = decode_u256(&results[offset]);
            offset += 1;
            if earned > U256::ZERO {
                earned_tokens.push(RewardToken {
                    token: asset.clone(),
                    rewards_earned: format_bn(earned, asset.decimals),
                });
            }
        }
        if earned_tokens.is_empty() {
            continue;
        }
        let mut tagged = (*pair).clone();
        tagged.reward_type = Some(RewardType::Reward);
        if let Some(gauge) = &mut tagged.gauge {
            gauge.reward_tokens = earned_tokens;
        }
        out.push(tagged);
    }
    Ok(out)
}

async fn fee_claims(ctx: &StoreContext, snapshot: &StateSnapshot) -> Result<Vec<Pair>, AppError> {
    let account = ctx.config.account;
    let candidates: Vec<&Pair> = snapshot
        .pairs
        .iter()
        .filter(|pair| pair.has_position())
        .collect();
    let results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &candidates, |pending, pair| {
            pending.push(RawCall {
                target: pair.address,
                calldata: IPair::claimable0Call { account }.abi_encode().into(),
            });
            pending.push(RawCall {
                target: pair.address,
                calldata: IPair::claimable1Call { account }.abi_encode().into(),
            });
        })
        .await?;

    Ok(candidates
        .iter()
        .enumerate()
        .filter_map(|(index, pair)| {
            let claimable0 = decode_u256(&results[index * 2]);
            let claimable1 = decode_u256(&results[index * 2 + 1]);
            if claimable0 == U256::ZERO && claimable1 == U256::ZERO {
                return None;
            }
            let mut tagged = (*pair).clone();
            tagged.claimable0 = format_bn(claimable0, pair.token0.decimals);
            tagged.claimable1 = format_bn(claimable1, pair.token1.decimals);
            tagged.reward_type = Some(RewardType::Fees);
            Some(tagged)
        })
        .collect())
}

async fn bribe_claims(
    ctx: &StoreContext,
    snapshot: &StateSnapshot,
    token_id: u64,
) -> Result<Vec<Pair>, AppError> {
    if token_id == 0 {
        return Ok(Vec::new());
    }

    // Candidates are the bribe contracts the indexer records against this
    // lock; a lock with no attachments reads nothing.
    let user_info = match ctx.indexer.user(ctx.config.account).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(target: "rewards", error = %e, "User record unavailable, skipping bribes");
            None
        }
    };
    let Some(user) = user_info else {
        return Ok(Vec::new());
    };
    let Some(nft) = user
        .nfts
        .iter()
        .find(|nft| nft.id.parse::<u64>().ok() == Some(token_id))
    else {
        return Ok(Vec::new());
    };
    let candidates: Vec<(&Pair, Address)> = nft
        .bribes
        .iter()
        .filter_map(|attachment| {
            let bribe = Address::from_str(&attachment.bribe.id).ok()?;
            let pair = snapshot.pairs.iter().find(|pair| {
                lowercase_eq(&format!("{:#x}", pair.address), &attachment.bribe.pair.id)
            })?;
            Some((pair, bribe))
        })
        .collect();
    let Some((_, first_bribe)) = candidates.first().copied() else {
        return Ok(Vec::new());
    };

    // Bribe balances are tracked against a per-lock pseudo-address. The
    // mapping is identical on every bribe contract, so resolve it once.
    let pseudo_raw = ctx
        .gateway
        .call(
            first_bribe,
            IBribe::tokenIdToAddressCall {
                tokenId: U256::from(token_id),
            }
            .abi_encode()
            .into(),
        )
        .await?;
    let pseudo = IBribe::tokenIdToAddressCall::abi_decode_returns(&pseudo_raw)
        .map_err(|e| AppError::Validation {
            field: "token_id".to_string(),
            message: format!("lock address lookup failed: {}", e),
        })?;

    // Phase one: how many bribe tokens each contract pays out.
    let count_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &candidates, |pending, (_, bribe)| {
            pending.push(RawCall {
                target: *bribe,
                calldata: IBribe::rewardTokensLengthCall {}.abi_encode().into(),
            });
        })
        .await?;
    let counts: Vec<usize> = count_results
        .iter()
        .map(|raw| decode_u256(raw).try_into().unwrap_or(0usize))
        .collect();

    // Phase two: the token address behind every (bribe, index) slot.
    let indexed: Vec<(Address, usize)> = candidates
        .iter()
        .zip(counts.iter())
        .map(|((_, bribe), count)| (*bribe, *count))
        .collect();
    let token_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &indexed, |pending, (bribe, count)| {
            for index in 0..*count {
                pending.push(RawCall {
                    target: *bribe,
                    calldata: IBribe::rewardTokensCall {
                        index: U256::from(index),
                    }
                    .abi_encode()
                    .into(),
                });
            }
        })
        .await?;

    let mut tokens_per_bribe: Vec<Vec<Address>> = Vec::with_capacity(counts.len());
    let mut offset = 0usize;
    for count in &counts {
        let tokens = token_results[offset..offset + count]
            .iter()
            .filter_map(|raw| IBribe::rewardTokensCall::abi_decode_returns(raw).ok())
            .collect();
        offset += count;
        tokens_per_bribe.push(tokens);
    }

    // Resolve metadata for bribe tokens the listing does not know yet.
    let mut unknown: Vec<Address> = Vec::new();
    for tokens in &tokens_per_bribe {
        for token in tokens {
            let address = format!("{:#x}", token);
            let listed = snapshot
                .base_assets
                .iter()
                .any(|asset| asset.same_address(&address));
            if !listed && !unknown.contains(token) {
                unknown.push(*token);
            }
        }
    }
    let metadata_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &unknown, |pending, token| {
            pending.push(RawCall {
                target: *token,
                calldata: IErc20::symbolCall {}.abi_encode().into(),
            });
            pending.push(RawCall {
                target: *token,
                calldata: IErc20::decimalsCall {}.abi_encode().into(),
            });
        })
        .await?;
    let discovered: Vec<Asset> = unknown
        .iter()
        .enumerate()
        .map(|(index, token)| {
            let symbol = IErc20::symbolCall::abi_decode_returns(&metadata_results[index * 2])
                .unwrap_or_else(|_| format!("{:#x}", token));
            let decimals = IErc20::decimalsCall::abi_decode_returns(&metadata_results[index * 2 + 1])
                .unwrap_or(18);
            Asset {
                address: format!("{:#x}", token),
                symbol: symbol.clone(),
                name: symbol,
                decimals,
                logo_uri: None,
                balance: "0".to_string(),
                is_whitelisted: false,
                local: false,
            }
        })
        .collect();
    let lookup_asset = |token: &Address| -> Asset {
        let address = format!("{:#x}", token);
        snapshot
            .base_assets
            .iter()
            .find(|asset| asset.same_address(&address))
            .or_else(|| discovered.iter().find(|asset| asset.same_address(&address)))
            .cloned()
            .unwrap_or_else(|| Asset {
                address: address.clone(),
                symbol: address.clone(),
                name: address,
                decimals: 18,
                logo_uri: None,
                balance: "0".to_string(),
                is_whitelisted: false,
                local: false,
            })
    };

    // Phase three: earned amounts per (bribe, token) for the lock.
    let flat: Vec<(Address, Address)> = indexed
        .iter()
        .zip(tokens_per_bribe.iter())
        .flat_map(|((bribe, _), tokens)| tokens.iter().map(|token| (*bribe, *token)))
        .collect();
    let earned_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &flat, |pending, (bribe, token)| {
            pending.push(RawCall {
                target: *bribe,
                calldata: IBribe::earnedCall {
                    token: *token,
                    account: pseudo,
                }
                .abi_encode()
                .into(),
            });
        })
        .await?;

    let mut out = Vec::new();
    let mut cursor = 0usize;
    for ((pair, _), tokens) in candidates.iter().zip(tokens_per_bribe.iter()) {
        let mut earned_tokens: Vec<BribeEarned> = Vec::new();
        for token in tokens {
            let earned = decode_u256(&earned_results[cursor]);
            cursor += 1;
            if earned > U256::ZERO {
                let asset = lookup_asset(token);
                earned_tokens.push(BribeEarned {
                    earned: format_bn(earned, asset.decimals),
                    token: asset,
                });
            }
        }
        if earned_tokens.is_empty() {
            continue;
        }
        let mut tagged = (*pair).clone();
        tagged.reward_type = Some(RewardType::Bribe);
        if let Some(gauge) = &mut tagged.gauge {
            gauge.bribes_earned = earned_tokens;
        }
        out.push(tagged);
    }
    Ok(out)
}

/// Token addresses to pass to `getReward`: the gauge's configured (or
/// earned) emission tokens, governance token when it lists none.
fn reward_claim_tokens(ctx: &StoreContext, gauge: &Gauge) -> Vec<Address> {
    let tokens: Vec<Address> = gauge
        .reward_tokens
        .iter()
        .filter_map(|rt| rt.token.evm_address())
        .collect();
    if tokens.is_empty() {
        vec![ctx.config.gov_token]
    } else {
        tokens
    }
}

fn find_pair(snapshot: &StateSnapshot, pair_address: Address) -> Result<Pair, AppError> {
    snapshot
        .pairs
        .iter()
        .find(|pair| pair.address == pair_address)
        .cloned()
        .ok_or_else(|| AppError::Validation {
            field: "pair_address".to_string(),
            message: format!("unknown pair {:#x}", pair_address),
        })
}

/// Bribe token addresses to pass to `claimBribes` for one pair: the
/// earned set from the current bundle when available, otherwise every
/// reward token the bribe contract lists.
fn bribe_tokens_for(snapshot: &StateSnapshot, pair_address: Address) -> Vec<Address> {
    snapshot
        .rewards
        .bribes
        .iter()
        .find(|pair| pair.address == pair_address)
        .and_then(|pair| pair.gauge.as_ref())
        .map(|gauge| {
            gauge
                .bribes_earned
                .iter()
                .filter_map(|bribe| Address::from_str(&bribe.token.address).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub async fn claim_bribes(
    ctx: &StoreContext,
    pair_address: Address,
    token_id: u64,
) -> Result<(), AppError> {
    let snapshot = ctx.state.snapshot();
    let pair = find_pair(&snapshot, pair_address)?;
    let gauge = pair.gauge.as_ref().ok_or_else(|| AppError::Validation {
        field: "pair_address".to_string(),
        message: format!("pair {:#x} has no gauge", pair_address),
    })?;
    let tokens = bribe_tokens_for(&snapshot, pair_address);
    if tokens.is_empty() {
        return Err(AppError::NothingToClaim);
    }

    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Claim bribes", &["Claim bribes"]);
    let calldata = IVoter::claimBribesCall {
        bribes: vec![gauge.bribe_address],
        tokens: vec![tokens],
        tokenId: U256::from(token_id),
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(ctx.config.voter, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::ClaimBribes));
    assets::refresh_balances(ctx).await
}

pub async fn claim_fees(ctx: &StoreContext, pair_address: Address) -> Result<(), AppError> {
    let snapshot = ctx.state.snapshot();
    let pair = find_pair(&snapshot, pair_address)?;

    let (queue, ids) = TxQueue::stage(
        ctx.bus.clone(),
        "Claim fees",
        &[&format!("Claim fees for {}", pair.symbol)],
    );
    let calldata = IPair::claimFeesCall {}.abi_encode();
    ctx.lifecycle
        .execute(&queue, ids[0], CallSpec::new(pair.address, calldata.into()))
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::ClaimFees));
    assets::refresh_balances(ctx).await
}

pub async fn claim_rewards(ctx: &StoreContext, pair_address: Address) -> Result<(), AppError> {
    let snapshot = ctx.state.snapshot();
    let pair = find_pair(&snapshot, pair_address)?;
    let gauge = pair.gauge.as_ref().ok_or_else(|| AppError::Validation {
        field: "pair_address".to_string(),
        message: format!("pair {:#x} has no gauge", pair_address),
    })?;

    let (queue, ids) = TxQueue::stage(
        ctx.bus.clone(),
        "Claim rewards",
        &[&format!("Claim rewards for {}", pair.symbol)],
    );
    let calldata = IGauge::getRewardCall {
        account: ctx.config.account,
        tokens: reward_claim_tokens(ctx, gauge),
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(gauge.address, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::ClaimRewards));
    assets::refresh_balances(ctx).await
}

pub async fn claim_distribution(ctx: &StoreContext, token_id: u64) -> Result<(), AppError> {
    let (queue, ids) = TxQueue::stage(
        ctx.bus.clone(),
        "Claim distribution",
        &[&format!("Claim distribution for lock #{}", token_id)],
    );
    let calldata = IVeDist::claimCall {
        tokenId: U256::from(token_id),
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(ctx.config.ve_dist, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::ClaimDistribution));
    assets::refresh_balances(ctx).await
}

/// Claim everything in the current bundle in one staged batch: a single
/// aggregated bribe claim first, then fees pair by pair, then gauge
/// rewards pair by pair, then each lock distribution, strictly in order.
/// A failed step leaves earlier confirmed claims untouched.
pub async fn claim_all(ctx: &StoreContext, token_id: u64) -> Result<(), AppError> {
    let snapshot = ctx.state.snapshot();
    let bundle = &snapshot.rewards;

    if bundle.bribes.is_empty() && bundle.fees.is_empty() && bundle.rewards.is_empty()
        && bundle.ve_dist.is_empty()
    {
        ctx.bus
            .publish(StoreEvent::Error("Nothing to claim".to_string()));
        ctx.bus
            .publish(StoreEvent::ActionCompleted(ActionKind::ClaimAllRewards));
        return Ok(());
    }

    // A bundle entry that lost its gauge cannot be claimed; it never gets
    // a queue step.
    let reward_claims: Vec<(&Pair, &Gauge)> = bundle
        .rewards
        .iter()
        .filter_map(|pair| pair.gauge.as_ref().map(|gauge| (pair, gauge)))
        .collect();

    let mut descriptions: Vec<String> = Vec::new();
    if !bundle.bribes.is_empty() {
        descriptions.push("Claim all bribes".to_string());
    }
    for pair in &bundle.fees {
        descriptions.push(format!("Claim fees for {}", pair.symbol));
    }
    for (pair, _) in &reward_claims {
        descriptions.push(format!("Claim rewards for {}", pair.symbol));
    }
    for claim in &bundle.ve_dist {
        descriptions.push(format!("Claim distribution for lock #{}", claim.lock.id));
    }
    let description_refs: Vec<&str> = descriptions.iter().map(String::as_str).collect();
    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Claim all rewards", &description_refs);
    let mut step = 0usize;

    if !bundle.bribes.is_empty() {
        let mut send_bribes: Vec<Address> = Vec::new();
        let mut send_tokens: Vec<Vec<Address>> = Vec::new();
        for pair in &bundle.bribes {
            let Some(gauge) = &pair.gauge else { continue };
            let tokens: Vec<Address> = gauge
                .bribes_earned
                .iter()
                .filter_map(|bribe| Address::from_str(&bribe.token.address).ok())
                .collect();
            if tokens.is_empty() {
                continue;
            }
            send_bribes.push(gauge.bribe_address);
            send_tokens.push(tokens);
        }
        let calldata = IVoter::claimBribesCall {
            bribes: send_bribes,
            tokens: send_tokens,
            tokenId: U256::from(token_id),
        }
        .abi_encode();
        ctx.lifecycle
            .execute(
                &queue,
                ids[step],
                CallSpec::new(ctx.config.voter, calldata.into()),
            )
            .await?;
        step += 1;
    }

    for pair in &bundle.fees {
        let calldata = IPair::claimFeesCall {}.abi_encode();
        ctx.lifecycle
            .execute(&queue, ids[step], CallSpec::new(pair.address, calldata.into()))
            .await?;
        step += 1;
    }

    for (_, gauge) in &reward_claims {
        let calldata = IGauge::getRewardCall {
            account: ctx.config.account,
            tokens: reward_claim_tokens(ctx, gauge),
        }
        .abi_encode();
        ctx.lifecycle
            .execute(
                &queue,
                ids[step],
                CallSpec::new(gauge.address, calldata.into()),
            )
            .await?;
        step += 1;
    }

    for claim in &bundle.ve_dist {
        let calldata = IVeDist::claimCall {
            tokenId: U256::from(claim.lock.id),
        }
        .abi_encode();
        ctx.lifecycle
            .execute(
                &queue,
                ids[step],
                CallSpec::new(ctx.config.ve_dist, calldata.into()),
            )
            .await?;
        step += 1;
    }

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::ClaimAllRewards));
    assets::refresh_balances(ctx).await?;
    collect(ctx, token_id).await
}
