// SPDX-License-Identifier: MIT

use crate::domain::model::{Asset, Pair, RewardBundle, VestLock};
use std::sync::RwLock;

/// Governance token with the account's live balance.
#[derive(Debug, Clone, Default)]
pub struct GovTokenState {
    pub asset: Option<Asset>,
}

/// Vote-escrow token plus the distribution APR reported by the indexer.
#[derive(Debug, Clone, Default)]
pub struct VeTokenState {
    pub asset: Option<Asset>,
    pub ve_dist_apr: String,
}

/// The full observable state. Cheap to clone: observers always work on a
/// snapshot, never on live references into the store.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub gov_token: GovTokenState,
    pub ve_token: VeTokenState,
    pub base_assets: Vec<Asset>,
    pub pairs: Vec<Pair>,
    pub locks: Vec<VestLock>,
    pub rewards: RewardBundle,
    /// USD price of the native asset, as reported by the indexer.
    pub native_price_usd: String,
}

pub struct AppState {
    inner: RwLock<StateSnapshot>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StateSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Shallow-merge style mutation: the closure edits only the fields it
    /// owns and everything else carries over untouched.
    pub fn apply(&self, mutate: impl FnOnce(&mut StateSnapshot)) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        mutate(&mut guard);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_preserves_unrelated_fields() {
        let state = AppState::new();
        state.apply(|s| {
            s.ve_token.ve_dist_apr = "12.5".to_string();
        });
        state.apply(|s| {
            s.locks.push(VestLock {
                id: 7,
                lock_ends: 0,
                lock_amount: "1".to_string(),
                lock_value: "1".to_string(),
            });
        });
        let snapshot = state.snapshot();
        assert_eq!(snapshot.ve_token.ve_dist_apr, "12.5");
        assert_eq!(snapshot.locks.len(), 1);
    }

    #[test]
    fn snapshots_are_detached_from_later_mutations() {
        let state = AppState::new();
        let before = state.snapshot();
        state.apply(|s| s.base_assets.push(Asset::native()));
        assert!(before.base_assets.is_empty());
        assert_eq!(state.snapshot().base_assets.len(), 1);
    }
}
