// SPDX-License-Identifier: MIT

//! Router swaps plus the wrap/unwrap shortcut between the native asset and
//! its wrapped ERC-20.

use crate::common::parsing::parse_bn;
use crate::domain::constants::SWAP_DEADLINE_SECS;
use crate::domain::error::AppError;
use crate::infrastructure::network::abi::{IRouter, IWrappedNative, Route};
use crate::infrastructure::network::gateway::CallSpec;
use crate::services::store::StoreContext;
use crate::services::store::events::{ActionKind, StoreEvent};
use crate::services::tx::allowance::ensure_allowance;
use crate::services::tx::batch::TxQueue;
use crate::services::assets;
use alloy::primitives::U256;
use alloy_sol_types::SolCall;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::model::SwapRequest;

fn deadline() -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    U256::from(now + SWAP_DEADLINE_SECS)
}

/// Slippage tolerance in basis points, clamped to [0, 100%].
fn slippage_bps(percent: &str) -> u64 {
    let parsed: f64 = percent.trim().parse().unwrap_or(0.0);
    ((parsed * 100.0).round().max(0.0) as u64).min(10_000)
}

fn min_out(expected_raw: U256, bps: u64) -> U256 {
    expected_raw * U256::from(10_000 - bps) / U256::from(10_000)
}

fn to_abi_routes(request: &SwapRequest) -> Vec<Route> {
    request
        .routes
        .iter()
        .map(|r| Route {
            from: r.from,
            to: r.to,
            stable: r.stable,
        })
        .collect()
}

pub async fn swap(ctx: &StoreContext, request: SwapRequest) -> Result<(), AppError> {
    if request.routes.is_empty() {
        return Err(AppError::Validation {
            field: "routes".to_string(),
            message: "swap needs at least one route hop".to_string(),
        });
    }
    let amount_in = parse_bn(&request.amount_in, request.from_asset.decimals)?;
    let expected = parse_bn(&request.expected_out, request.to_asset.decimals)?;
    let amount_out_min = min_out(expected, slippage_bps(&request.slippage_percent));
    let routes = to_abi_routes(&request);
    let account = ctx.config.account;
    let swap_description = format!(
        "Swap {} for {}",
        request.from_asset.symbol, request.to_asset.symbol
    );

    if request.from_asset.is_native() {
        let (queue, ids) = TxQueue::stage(ctx.bus.clone(), &swap_description, &[&swap_description]);
        let calldata = IRouter::swapExactETHForTokensCall {
            amountOutMin: amount_out_min,
            routes,
            to: account,
            deadline: deadline(),
        }
        .abi_encode();
        ctx.lifecycle
            .execute(
                &queue,
                ids[0],
                CallSpec::new(ctx.config.router, calldata.into()).with_value(amount_in),
            )
            .await?;
        return finish_swap(ctx).await;
    }

    // Token in: allowance gate ahead of the swap itself.
    let token_in = request
        .from_asset
        .evm_address()
        .ok_or_else(|| AppError::InvalidAddress(request.from_asset.address.clone()))?;
    let allowance_description = format!("Checking your {} allowance", request.from_asset.symbol);
    let (queue, ids) = TxQueue::stage(
        ctx.bus.clone(),
        &swap_description,
        &[&allowance_description, &swap_description],
    );
    ensure_allowance(
        &ctx.lifecycle,
        &queue,
        ids[0],
        token_in,
        &request.from_asset.symbol,
        account,
        ctx.config.router,
        amount_in,
    )
    .await?;

    let calldata = if request.to_asset.is_native() {
        IRouter::swapExactTokensForETHCall {
            amountIn: amount_in,
            amountOutMin: amount_out_min,
            routes,
            to: account,
            deadline: deadline(),
        }
        .abi_encode()
    } else if request.fee_on_transfer {
        IRouter::swapExactTokensForTokensSupportingFeeOnTransferTokensCall {
            amountIn: amount_in,
            amountOutMin: amount_out_min,
            routes,
            to: account,
            deadline: deadline(),
        }
        .abi_encode()
    } else {
        IRouter::swapExactTokensForTokensCall {
            amountIn: amount_in,
            amountOutMin: amount_out_min,
            routes,
            to: account,
            deadline: deadline(),
        }
        .abi_encode()
    };
    ctx.lifecycle
        .execute(
            &queue,
            ids[1],
            CallSpec::new(ctx.config.router, calldata.into()),
        )
        .await?;
    finish_swap(ctx).await
}

async fn finish_swap(ctx: &StoreContext) -> Result<(), AppError> {
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::Swap));
    assets::refresh_balances(ctx).await
}

pub async fn wrap(ctx: &StoreContext, amount: &str) -> Result<(), AppError> {
    let raw = parse_bn(amount, crate::domain::constants::NATIVE_DECIMALS)?;
    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Wrap", &["Wrap native token"]);
    let calldata = IWrappedNative::depositCall {}.abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(ctx.config.wrapped_native, calldata.into()).with_value(raw),
        )
        .await?;
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::Wrap));
    assets::refresh_balances(ctx).await
}

pub async fn unwrap(ctx: &StoreContext, amount: &str) -> Result<(), AppError> {
    let raw = parse_bn(amount, crate::domain::constants::NATIVE_DECIMALS)?;
    let (queue, ids) = TxQueue::stage(ctx.bus.clone(), "Unwrap", &["Unwrap to native token"]);
    let calldata = IWrappedNative::withdrawCall { amount: raw }.abi_encode();
    ctx.lifecycle
        .execute(
            &queue,
            ids[0],
            CallSpec::new(ctx.config.wrapped_native, calldata.into()),
        )
        .await?;
    ctx.bus
        .publish(StoreEvent::ActionCompleted(ActionKind::Unwrap));
    assets::refresh_balances(ctx).await
}
