// SPDX-License-Identifier: MIT

//! Token whitelisting: inspecting an arbitrary ERC-20 against the voter's
//! whitelist, and submitting a whitelist transaction for it.

use crate::common::parsing::{decode_u256, format_bn};
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::model::Asset;
use crate::infrastructure::network::abi::{IErc20, IVoter};
use crate::infrastructure::network::gateway::{CallSpec, RawCall};
use crate::services::store::StoreContext;
use crate::services::store::events::{ActionKind, StoreEvent};
use crate::services::tx::batch::TxQueue;
use alloy::primitives::Address;
use alloy_sol_types::SolCall;

/// Fetch metadata, whitelist status and the current listing fee for a
/// candidate token in one batched read.
pub async fn search(ctx: &StoreContext, address: Address) -> Result<(), AppError> {
    let voter = ctx.config.voter;
    let targets = [address];
    let results = ctx
        .reader
        .read(ctx.gateway.as_ref(), &targets, |pending, token| {
            pending.push(RawCall {
                target: *token,
                calldata: IErc20::symbolCall {}.abi_encode().into(),
            });
            pending.push(RawCall {
                target: *token,
                calldata: IErc20::nameCall {}.abi_encode().into(),
            });
            pending.push(RawCall {
                target: *token,
                calldata: IErc20::decimalsCall {}.abi_encode().into(),
            });
            pending.push(RawCall {
                target: voter,
                calldata: IVoter::isWhitelistedCall { token: *token }
                    .abi_encode()
                    .into(),
            });
            pending.push(RawCall {
                target: voter,
                calldata: IVoter::listingFeeCall {}.abi_encode().into(),
            });
        })
        .await?;

    let symbol = IErc20::symbolCall::abi_decode_returns(&results[0])
        .map_err(|_| AppError::InvalidAddress(format!("{:#x}", address)))?;
    let name = IErc20::nameCall::abi_decode_returns(&results[1]).unwrap_or_else(|_| symbol.clone());
    let decimals = IErc20::decimalsCall::abi_decode_returns(&results[2]).unwrap_or(18);
    let whitelisted = IVoter::isWhitelistedCall::abi_decode_returns(&results[3]).unwrap_or(false);
    let listing_fee = format_bn(decode_u256(&results[4]), constants::GOV_TOKEN_DECIMALS);

    let asset = Asset {
        address: format!("{:#x}", address),
        symbol,
        name,
        decimals,
        logo_uri: None,
        balance: "0".to_string(),
        is_whitelisted: whitelisted,
        local: false,
    };
    tracing::debug!(
        target: "whitelist",
        token = %asset.address,
        symbol = %asset.symbol,
        whitelisted,
        "Whitelist lookup"
    );

    ctx.bus.publish(StoreEvent::WhitelistFound {
        asset,
        whitelisted,
        listing_fee,
    });
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::SearchWhitelist));
    Ok(())
}

pub async fn submit(ctx: &StoreContext, address: Address) -> Result<(), AppError> {
    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Whitelist token", &["Whitelist token"]);
    let calldata = IVoter::whitelistCall { token: address }.abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(ctx.config.voter, calldata.into()),
        )
        .await?;

    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::WhitelistToken));
    Ok(())
}
