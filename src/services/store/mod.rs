// SPDX-License-Identifier: MIT

pub mod command;
pub mod events;
pub mod state;

use crate::app::config::GlobalSettings;
use crate::domain::constants;
use crate::infrastructure::data::local_assets::LocalAssetStore;
use crate::infrastructure::network::gateway::ChainGateway;
use crate::infrastructure::network::multicall::BatchedReader;
use crate::infrastructure::network::subgraph::Indexer;
use crate::services::tx::lifecycle::TxLifecycle;
use crate::services::{assets, rewards, swap, vest, votes, whitelist};
use alloy::primitives::Address;
use command::Command;
use events::{EventBus, StoreEvent};
use state::{AppState, StateSnapshot};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::broadcast;
use tokio::sync::mpsc;

/// Frozen per-run parameters. Built once from settings; handlers never
/// read the environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub account: Address,
    pub router: Address,
    pub voter: Address,
    pub ve_dist: Address,
    pub wrapped_native: Address,
    pub gov_token: Address,
    pub ve_token: Address,
    pub gas_price_gwei: Option<u64>,
    pub multicall_ceiling: usize,
    pub local_assets_path: String,
}

impl StoreConfig {
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        Self {
            account: settings.account_address,
            router: settings.router_address(),
            voter: settings.voter_address(),
            ve_dist: settings.ve_dist_address(),
            wrapped_native: constants::WRAPPED_NATIVE,
            gov_token: constants::GOV_TOKEN,
            ve_token: constants::VE_TOKEN,
            gas_price_gwei: settings.gas_price_gwei,
            multicall_ceiling: settings.multicall_batch_ceiling_value(),
            local_assets_path: settings.local_assets_path_value(),
        }
    }
}

/// Shared handler environment. One instance lives for the whole session;
/// every dispatched command runs against the same context.
pub struct StoreContext {
    pub config: StoreConfig,
    pub gateway: Arc<dyn ChainGateway>,
    pub indexer: Arc<dyn Indexer>,
    pub local_assets: LocalAssetStore,
    pub bus: EventBus,
    pub state: AppState,
    pub lifecycle: TxLifecycle,
    pub reader: BatchedReader,
    /// Set while a configure pass runs; a second Configure is a no-op.
    pub configuring: AtomicBool,
    /// Set while the reward engine runs; a second CollectRewards is a no-op.
    pub rewards_loading: AtomicBool,
}

impl StoreContext {
    pub fn new(
        config: StoreConfig,
        gateway: Arc<dyn ChainGateway>,
        indexer: Arc<dyn Indexer>,
    ) -> Arc<Self> {
        let lifecycle = TxLifecycle::new(gateway.clone(), config.gas_price_gwei);
        let reader = BatchedReader::new(config.multicall_ceiling);
        let local_assets = LocalAssetStore::new(config.local_assets_path.clone());
        Arc::new(Self {
            config,
            gateway,
            indexer,
            local_assets,
            bus: EventBus::default(),
            state: AppState::new(),
            lifecycle,
            reader,
            configuring: AtomicBool::new(false),
            rewards_loading: AtomicBool::new(false),
        })
    }

    /// Mutate state and tell observers the snapshot changed.
    pub fn set_state(&self, mutate: impl FnOnce(&mut StateSnapshot)) {
        self.state.apply(mutate);
        self.bus.publish(StoreEvent::StoreUpdated);
    }
}

/// Command entry point. Dispatch is fire-and-forget: each command runs on
/// its own task so a slow chain interaction never blocks the intake loop.
pub struct Store {
    ctx: Arc<StoreContext>,
    sender: mpsc::Sender<Command>,
}

impl Store {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Command>(64);
        let loop_ctx = ctx.clone();
        tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                let ctx = loop_ctx.clone();
                tokio::spawn(async move {
                    handle(ctx, command).await;
                });
            }
        });
        Self { ctx, sender }
    }

    pub async fn dispatch(&self, command: Command) {
        if self.sender.send(command).await.is_err() {
            tracing::error!(target: "store", "Dispatch loop is gone");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.ctx.bus.subscribe()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.ctx.state.snapshot()
    }

    pub fn context(&self) -> &Arc<StoreContext> {
        &self.ctx
    }
}

async fn handle(ctx: Arc<StoreContext>, command: Command) {
    tracing::debug!(target: "store", ?command, "Handling command");
    let result = match command {
        Command::Configure => assets::configure(&ctx).await,
        Command::RefreshBalances => assets::refresh_balances(&ctx).await,

        Command::Swap(request) => swap::swap(&ctx, request).await,
        Command::Wrap { amount } => swap::wrap(&ctx, &amount).await,
        Command::Unwrap { amount } => swap::unwrap(&ctx, &amount).await,

        Command::CreateLock {
            amount,
            duration_secs,
        } => vest::create_lock(&ctx, &amount, duration_secs).await,
        Command::IncreaseLockAmount { token_id, amount } => {
            vest::increase_lock_amount(&ctx, token_id, &amount).await
        }
        Command::IncreaseLockDuration {
            token_id,
            duration_secs,
        } => vest::increase_lock_duration(&ctx, token_id, duration_secs).await,
        Command::MergeLocks {
            from_token_id,
            to_token_id,
        } => vest::merge_locks(&ctx, from_token_id, to_token_id).await,
        Command::WithdrawLock { token_id } => vest::withdraw_lock(&ctx, token_id).await,
        Command::LoadLocks => vest::load_locks(&ctx).await,

        Command::Vote { token_id, votes } => votes::vote(&ctx, token_id, votes).await,
        Command::ResetVote { token_id } => votes::reset(&ctx, token_id).await,
        Command::QueryVotes { token_id } => votes::query(&ctx, token_id).await,

        Command::CollectRewards { token_id } => rewards::collect(&ctx, token_id).await,
        Command::ClaimBribes {
            pair_address,
            token_id,
        } => rewards::claim_bribes(&ctx, pair_address, token_id).await,
        Command::ClaimFees { pair_address } => rewards::claim_fees(&ctx, pair_address).await,
        Command::ClaimRewards { pair_address } => rewards::claim_rewards(&ctx, pair_address).await,
        Command::ClaimDistribution { token_id } => {
            rewards::claim_distribution(&ctx, token_id).await
        }
        Command::ClaimAllRewards { token_id } => rewards::claim_all(&ctx, token_id).await,

        Command::SearchWhitelist { address } => whitelist::search(&ctx, address).await,
        Command::WhitelistToken { address } => whitelist::submit(&ctx, address).await,

        Command::AddLocalAsset(asset) => assets::add_local(&ctx, asset).await,
        Command::RemoveLocalAsset { address } => assets::remove_local(&ctx, &address).await,
    };

    if let Err(error) = result {
        tracing::error!(target: "store", %error, "Command failed");
        ctx.bus.publish(StoreEvent::Error(error.to_string()));
    }
}
