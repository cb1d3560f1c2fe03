// SPDX-License-Identifier: MIT

use crate::domain::model::{Asset, Vote};
use crate::services::tx::batch::{TxStatus, TxStepInfo};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Which store operation an `ActionCompleted` event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Configure,
    RefreshBalances,
    Swap,
    Wrap,
    Unwrap,
    CreateLock,
    IncreaseLockAmount,
    IncreaseLockDuration,
    MergeLocks,
    WithdrawLock,
    LoadLocks,
    Vote,
    ResetVote,
    QueryVotes,
    CollectRewards,
    ClaimBribes,
    ClaimFees,
    ClaimRewards,
    ClaimDistribution,
    ClaimAllRewards,
    SearchWhitelist,
    WhitelistToken,
    AddLocalAsset,
    RemoveLocalAsset,
}

/// Everything observers can learn from the store. Transaction progress is
/// streamed step by step; operation results land in the state snapshot and
/// are announced with `ActionCompleted`.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// State snapshot changed; observers should re-read it.
    StoreUpdated,
    Error(String),

    /// A transaction batch was staged; steps are listed in execution order.
    TxQueued {
        title: String,
        steps: Vec<TxStepInfo>,
    },
    TxStatus {
        id: Uuid,
        status: TxStatus,
        hash: Option<String>,
        detail: Option<String>,
    },

    ActionCompleted(ActionKind),
    VotesReturned(Vec<Vote>),
    WhitelistFound {
        asset: Asset,
        whitelisted: bool,
        listing_fee: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Lossy fan-out: publishing with no subscribers is fine, and slow
    /// subscribers drop old events rather than block the store.
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
