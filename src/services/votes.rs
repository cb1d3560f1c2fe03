// SPDX-License-Identifier: MIT

//! Gauge voting for a vote-escrow lock: casting weighted votes, resetting
//! them, and reading the current on-chain weights back as percentages.

use crate::domain::error::AppError;
use crate::domain::model::{Vote, VoteInput};
use crate::infrastructure::network::abi::IVoter;
use crate::infrastructure::network::gateway::{CallSpec, RawCall};
use crate::services::store::StoreContext;
use crate::services::store::events::{ActionKind, StoreEvent};
use crate::services::tx::batch::TxQueue;
use alloy::primitives::{Address, I256, U256};
use alloy_sol_types::SolCall;

/// Convert a user-facing percent string into the router's weight scale
/// (percent times one hundred). Zero and unparseable values drop out.
fn weight_of(input: &VoteInput) -> Option<i64> {
    let parsed: f64 = input.value.trim().parse().ok()?;
    let weight = (parsed * 100.0).round() as i64;
    if weight == 0 { None } else { Some(weight) }
}

pub async fn vote(
    ctx: &StoreContext,
    token_id: u64,
    votes: Vec<VoteInput>,
) -> Result<(), AppError> {
    let mut pools: Vec<Address> = Vec::new();
    let mut weights: Vec<I256> = Vec::new();
    for input in &votes {
        if let Some(weight) = weight_of(input) {
            pools.push(input.pool_address);
            weights.push(I256::try_from(weight).map_err(|e| AppError::Validation {
                field: "votes".to_string(),
                message: e.to_string(),
            })?);
        }
    }
    if pools.is_empty() {
        return Err(AppError::Validation {
            field: "votes".to_string(),
            message: "all votes are zero".to_string(),
        });
    }

    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Cast votes", &["Cast votes"]);
    let calldata = IVoter::voteCall {
        tokenId: U256::from(token_id),
        poolVote: pools,
        weights,
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
        .publish(StoreEvent::ActionCompleted(ActionKind::Vote));
    query(ctx, token_id).await
}

pub async fn reset(ctx: &StoreContext, token_id: u64) -> Result<(), AppError> {
    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Reset votes", &["Reset votes"]);
    let calldata = IVoter::resetCall {
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
        .publish(StoreEvent::ActionCompleted(ActionKind::ResetVote));
    query(ctx, token_id).await
}

/// Read the lock's current vote weights for every gauge pair and normalize
/// them into signed percentages of the total absolute weight.
pub async fn query(ctx: &StoreContext, token_id: u64) -> Result<(), AppError> {
    let snapshot = ctx.state.snapshot();
    let gauge_pairs: Vec<Address> = snapshot
        .pairs
        .iter()
        .filter(|pair| pair.gauge.is_some())
        .map(|pair| pair.address)
        .collect();

    let results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &gauge_pairs, |pending, pool| {
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

    let raw_votes: Vec<(Address, f64)> = gauge_pairs
        .iter()
        .zip(results.iter())
        .filter_map(|(pool, raw)| {
            let value = IVoter::votesCall::abi_decode_returns(raw).ok()?;
            let as_float: f64 = value.to_string().parse().ok()?;
            (as_float != 0.0).then_some((*pool, as_float))
        })
        .collect();

    let total_abs: f64 = raw_votes.iter().map(|(_, v)| v.abs()).sum();
    let votes: Vec<Vote> = if total_abs == 0.0 {
        Vec::new()
    } else {
        raw_votes
            .iter()
            .map(|(pool, value)| Vote {
                pool_address: *pool,
                vote_percent: format!("{:.2}", value / total_abs * 100.0),
            })
            .collect()
    };

    ctx.bus.publish(StoreEvent::VotesReturned(votes));
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::QueryVotes));
    Ok(())
}
