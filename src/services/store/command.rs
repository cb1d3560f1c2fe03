// SPDX-License-Identifier: MIT

use crate::domain::model::{Asset, SwapRequest, VoteInput};
use alloy::primitives::Address;

/// Discriminated store input. Commands carry everything their handler
/// needs; results surface through events and the state snapshot, never
/// through a return channel.
#[derive(Debug, Clone)]
pub enum Command {
    /// Full bootstrap: token listings, pairs, then a balance refresh.
    Configure,
    RefreshBalances,

    Swap(SwapRequest),
    /// Native -> wrapped native, `amount` as a decimal string.
    Wrap { amount: String },
    Unwrap { amount: String },

    CreateLock {
        amount: String,
        duration_secs: u64,
    },
    IncreaseLockAmount {
        token_id: u64,
        amount: String,
    },
    IncreaseLockDuration {
        token_id: u64,
        duration_secs: u64,
    },
    MergeLocks {
        from_token_id: u64,
        to_token_id: u64,
    },
    WithdrawLock {
        token_id: u64,
    },
    LoadLocks,

    Vote {
        token_id: u64,
        votes: Vec<VoteInput>,
    },
    ResetVote {
        token_id: u64,
    },
    QueryVotes {
        token_id: u64,
    },

    /// Rebuild the reward bundle for the given lock.
    CollectRewards {
        token_id: u64,
    },
    ClaimBribes {
        pair_address: Address,
        token_id: u64,
    },
    ClaimFees {
        pair_address: Address,
    },
    ClaimRewards {
        pair_address: Address,
    },
    ClaimDistribution {
        token_id: u64,
    },
    ClaimAllRewards {
        token_id: u64,
    },

    SearchWhitelist {
        address: Address,
    },
    WhitelistToken {
        address: Address,
    },

    AddLocalAsset(Asset),
    RemoveLocalAsset {
        address: String,
    },
}
