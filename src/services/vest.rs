// SPDX-License-Identifier: MIT

//! Vote-escrow lock management: creating and growing locks, merging two
//! lock NFTs, withdrawing an expired lock, and enumerating the account's
//! locks on-chain.

use crate::common::parsing::{decode_u256, format_bn, parse_bn};
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::model::VestLock;
use crate::infrastructure::network::abi::{IVoter, IVotingEscrow};
use crate::infrastructure::network::gateway::{CallSpec, RawCall};
use crate::services::store::StoreContext;
use crate::services::store::events::{ActionKind, StoreEvent};
use crate::services::tx::allowance::ensure_allowance;
use crate::services::tx::batch::TxQueue;
use crate::services::assets;
use alloy::primitives::{Address, U256};
use alloy_sol_types::SolCall;
use std::str::FromStr;

pub async fn create_lock(
    ctx: &StoreContext,
    amount: &str,
    duration_secs: u64,
) -> Result<(), AppError> {
    let raw = parse_bn(amount, constants::GOV_TOKEN_DECIMALS)?;
    let allowance_description = format!(
        "Checking your {} allowance",
        constants::GOV_TOKEN_SYMBOL
    );
    let (queue, ids) = TxQueue::stage(
        ctx.bus.clone(),
        "Create lock",
        &[&allowance_description, "Create lock"],
    );
    ensure_allowance(
        &ctx.lifecycle,
        &queue,
        ids[0],
        ctx.config.gov_token,
        constants::GOV_TOKEN_SYMBOL,
        ctx.config.account,
        ctx.config.ve_token,
        raw,
    )
    .await?;

    let calldata = IVotingEscrow::createLockCall {
        value: raw,
        lockDuration: U256::from(duration_secs),
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[1],
            CallSpec::new(ctx.config.ve_token, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::CreateLock));
    load_locks(ctx).await?;
    assets::refresh_balances(ctx).await
}

pub async fn increase_lock_amount(
    ctx: &StoreContext,
    token_id: u64,
    amount: &str,
) -> Result<(), AppError> {
    let raw = parse_bn(amount, constants::GOV_TOKEN_DECIMALS)?;
    let allowance_description = format!(
        "Checking your {} allowance",
        constants::GOV_TOKEN_SYMBOL
    );
    let (queue, ids) = TxQueue::stage(
        ctx.bus.clone(),
        "Increase lock amount",
        &[&allowance_description, "Increase lock amount"],
    );
    ensure_allowance(
        &ctx.lifecycle,
        &queue,
        ids[0],
        ctx.config.gov_token,
        constants::GOV_TOKEN_SYMBOL,
        ctx.config.account,
        ctx.config.ve_token,
        raw,
    )
    .await?;

    let calldata = IVotingEscrow::increaseAmountCall {
        tokenId: U256::from(token_id),
        value: raw,
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[1],
            CallSpec::new(ctx.config.ve_token, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::IncreaseLockAmount));
    load_locks(ctx).await?;
    assets::refresh_balances(ctx).await
}

pub async fn increase_lock_duration(
    ctx: &StoreContext,
    token_id: u64,
    duration_secs: u64,
) -> Result<(), AppError> {
    let (queue, ids) = TxQueue::stage(
        ctx.bus.clone(),
        "Extend lock",
        &["Extend lock duration"],
    );
    let calldata = IVotingEscrow::increaseUnlockTimeCall {
        tokenId: U256::from(token_id),
        lockDuration: U256::from(duration_secs),
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(ctx.config.ve_token, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::IncreaseLockDuration));
    load_locks(ctx).await
}

pub async fn merge_locks(
    ctx: &StoreContext,
    from_token_id: u64,
    to_token_id: u64,
) -> Result<(), AppError> {
    if from_token_id == to_token_id {
        return Err(AppError::Validation {
            field: "to_token_id".to_string(),
            message: "cannot merge a lock into itself".to_string(),
        });
    }
    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Merge locks", &["Merge locks"]);
    let calldata = IVotingEscrow::mergeCall {
        from: U256::from(from_token_id),
        to: U256::from(to_token_id),
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(ctx.config.ve_token, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::MergeLocks));
    load_locks(ctx).await
}

/// A lock with live gauge votes cannot be withdrawn; those are reset in a
/// preceding step.
async fn lock_has_votes(ctx: &StoreContext, token_id: u64) -> Result<bool, AppError> {
    let snapshot = ctx.state.snapshot();
    let pools: Vec<Address> = snapshot
        .pairs
        .iter()
        .filter(|pair| pair.gauge.is_some())
        .map(|pair| pair.address)
        .collect();
    let results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &pools, |pending, pool| {
            pending.push(RawCall {
                target: ctx.config.voter,
                calldata: IVoter::votesCall {
                    tokenId: U256::from(token_id),
                    pool: *pool,
                }
                .abi_encode()
                .into(),
            });
        })
        .await?;
    Ok(results.iter().any(|raw| {
        IVoter::votesCall::abi_decode_returns(raw)
            .map(|weight| !weight.is_zero())
            .unwrap_or(false)
    }))
}

pub async fn withdraw_lock(ctx: &StoreContext, token_id: u64) -> Result<(), AppError> {
    let has_votes = lock_has_votes(ctx, token_id).await?;

    let mut descriptions: Vec<&str> = Vec::new();
    if has_votes {
        descriptions.push("Reset votes");
    }
    descriptions.push("Withdraw lock");
    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Withdraw lock", &descriptions);
    let mut step = 0usize;

    if has_votes {
        let calldata = IVoter::resetCall {
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

    let calldata = IVotingEscrow::withdrawCall {
        tokenId: U256::from(token_id),
    }
    .abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[step],
            CallSpec::new(ctx.config.ve_token, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::WithdrawLock));
    load_locks(ctx).await?;
    assets::refresh_balances(ctx).await
}

/// Enumerate the account's lock NFTs and read each one's locked amount and
/// current voting power.
pub async fn load_locks(ctx: &StoreContext) -> Result<(), AppError> {
    let account = ctx.config.account;

    let raw_count = ctx
        .gateway
        .call(
            ctx.config.ve_token,
            IVotingEscrow::balanceOfCall { owner: account }
                .abi_encode()
                .into(),
        )
        .await?;
    let count = decode_u256(&raw_count).try_into().unwrap_or(0u64);

    let indexes: Vec<u64> = (0..count).collect();
    let id_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &indexes, |pending, index| {
            pending.push(RawCall {
                target: ctx.config.ve_token,
                calldata: IVotingEscrow::tokenOfOwnerByIndexCall {
                    owner: account,
                    index: U256::from(*index),
                }
                .abi_encode()
                .into(),
            });
        })
        .await?;
    let token_ids: Vec<u64> = id_results
        .iter()
        .map(|raw| decode_u256(raw).try_into().unwrap_or(0u64))
        .collect();

    let detail_results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &token_ids, |pending, token_id| {
            pending.push(RawCall {
                target: ctx.config.ve_token,
                calldata: IVotingEscrow::lockedCall {
                    tokenId: U256::from(*token_id),
                }
                .abi_encode()
                .into(),
            });
            pending.push(RawCall {
                target: ctx.config.ve_token,
                calldata: IVotingEscrow::balanceOfNFTCall {
                    tokenId: U256::from(*token_id),
                }
                .abi_encode()
                .into(),
            });
        })
        .await?;

    let mut locks = Vec::with_capacity(token_ids.len());
    for (slot, token_id) in token_ids.iter().enumerate() {
        let locked_raw = &detail_results[slot * 2];
        let power_raw = &detail_results[slot * 2 + 1];

        let (lock_amount, lock_ends) =
            match IVotingEscrow::lockedCall::abi_decode_returns(locked_raw) {
                Ok(ret) => {
                    // The escrow reports amount as int128; a lock can never
                    // hold a negative balance, so a parse failure reads as 0.
                    let amount =
                        U256::from_str(&ret.amount.to_string()).unwrap_or(U256::ZERO);
                    (
                        format_bn(amount, constants::GOV_TOKEN_DECIMALS),
                        ret.end.try_into().unwrap_or(0u64),
                    )
                }
                Err(e) => {
                    tracing::warn!(target: "vest", token_id, error = %e, "Undecodable lock");
                    ("0".to_string(), 0)
                }
            };

        locks.push(VestLock {
            id: *token_id,
            lock_ends,
            lock_amount,
            lock_value: format_bn(decode_u256(power_raw), constants::VE_TOKEN_DECIMALS),
        });
    }

    tracing::debug!(target: "vest", locks = locks.len(), "Loaded locks");
    ctx.set_state(|s| s.locks = locks);
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::LoadLocks));
    Ok(())
}
