// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use crate::infrastructure::network::abi::IErc20;
use crate::infrastructure::network::gateway::CallSpec;
use crate::services::tx::batch::TxQueue;
use crate::services::tx::lifecycle::TxLifecycle;
use alloy::primitives::{Address, U256};
use alloy_sol_types::SolCall;
use uuid::Uuid;

/// Check the current allowance and, only when it falls short of
/// `required`, run an unlimited approval through the staged step. A
/// sufficient allowance completes the step as `Done` without touching
/// the chain.
///
/// Returns `true` when an approval transaction was executed.
pub async fn ensure_allowance(
    lifecycle: &TxLifecycle,
    queue: &TxQueue,
    step_id: Uuid,
    token: Address,
    token_symbol: &str,
    owner: Address,
    spender: Address,
    required: U256,
) -> Result<bool, AppError> {
    let calldata = IErc20::allowanceCall { owner, spender }.abi_encode();
    let raw = lifecycle.gateway().call(token, calldata.into()).await?;
    let current = IErc20::allowanceCall::abi_decode_returns(&raw)
        .map_err(|e| AppError::Validation {
            field: "allowance".to_string(),
            message: e.to_string(),
        })?;

    if current >= required {
        queue.done(step_id, &format!("Allowance on {} sufficient", token_symbol));
        return Ok(false);
    }

    // Unlimited approval, so repeated operations skip this step next time.
    let approve = IErc20::approveCall {
        spender,
        amount: U256::MAX,
    }
    .abi_encode();
    lifecycle
        .execute(queue, step_id, CallSpec::new(token, approve.into()))
        .await?;
    Ok(true)
}
