// SPDX-License-Identifier: MIT
// Reward engine behavior: positive-amount filtering across the four
// claimable categories, the per-lock pseudo-address bribe walk, and the
// ordering guarantees of the claim-everything batch.

mod support;

use alloy::primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use std::sync::Arc;
use support::{MockGateway, MockIndexer};
use vedex::domain::model::{
    Asset, BribeEarned, DistributionClaim, Gauge, Pair, RewardBundle, RewardToken, RewardType,
    VestLock,
};
use vedex::infrastructure::network::abi::{IBribe, IGauge, IPair, IVeDist, IVoter};
use vedex::services::rewards;
use vedex::services::store::StoreContext;
use vedex::services::store::events::{ActionKind, StoreEvent};

const PAIR_A: Address = Address::repeat_byte(0xa1);
const GAUGE_A: Address = Address::repeat_byte(0xa2);
const BRIBE_A: Address = Address::repeat_byte(0xa3);
const PAIR_B: Address = Address::repeat_byte(0xb1);
const GAUGE_B: Address = Address::repeat_byte(0xb2);
const BRIBE_B: Address = Address::repeat_byte(0xb3);
const BRIBE_TOKEN: Address = Address::repeat_byte(0xd1);

fn asset(address: &str, symbol: &str) -> Asset {
    Asset {
        address: address.to_string(),
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        decimals: 18,
        logo_uri: None,
        balance: "0".to_string(),
        is_whitelisted: true,
        local: false,
    }
}

fn pair(address: Address, symbol: &str, gauge: Option<(Address, Address)>) -> Pair {
    Pair {
        address,
        symbol: symbol.to_string(),
        stable: false,
        token0: asset("0x00000000000000000000000000000000000000a0", "T0"),
        token1: asset("0x00000000000000000000000000000000000000b0", "T1"),
        reserve0: "1".to_string(),
        reserve1: "1".to_string(),
        total_supply: "1".to_string(),
        user_position: Some("1.0".to_string()),
        claimable0: "0".to_string(),
        claimable1: "0".to_string(),
        gauge: gauge.map(|(gauge_address, bribe_address)| Gauge {
            address: gauge_address,
            bribe_address,
            total_supply: "0".to_string(),
            user_balance: "0".to_string(),
            reward_tokens: Vec::new(),
            bribes_earned: Vec::new(),
        }),
        reward_type: None,
    }
}

fn lock(id: u64) -> VestLock {
    VestLock {
        id,
        lock_ends: 0,
        lock_amount: "1".to_string(),
        lock_value: "1".to_string(),
    }
}

/// Indexer record for lock #7 with bribe attachments on both pairs.
fn lock_user_record() -> vedex::infrastructure::network::subgraph::UserData {
    support::user_data(&format!(
        r#"{{"nfts":[{{"id":"7","lockedAmount":"1","lockedEnd":"0","bribes":[
            {{"bribe":{{"id":"{:#x}","pair":{{"id":"{:#x}"}}}}}},
            {{"bribe":{{"id":"{:#x}","pair":{{"id":"{:#x}"}}}}}}
        ]}}]}}"#,
        BRIBE_A, PAIR_A, BRIBE_B, PAIR_B
    ))
}

fn seeded_context(gateway: Arc<MockGateway>) -> Arc<StoreContext> {
    let config = support::test_config(Address::repeat_byte(0xcc));
    let gov = asset(&format!("{:#x}", config.gov_token), "CONE");
    let indexer = MockIndexer {
        user: Some(lock_user_record()),
        ..Default::default()
    };
    let ctx = support::context(config, gateway, indexer);
    ctx.state.apply(|s| {
        s.gov_token.asset = Some(gov);
        s.base_assets = vec![
            Asset::native(),
            asset(&format!("{:#x}", BRIBE_TOKEN), "BRB"),
        ];
        s.pairs = vec![
            pair(PAIR_A, "vAMM-A", Some((GAUGE_A, BRIBE_A))),
            pair(PAIR_B, "vAMM-B", Some((GAUGE_B, BRIBE_B))),
        ];
        s.locks = vec![lock(7)];
    });
    ctx
}

fn one_ether(multiple: u64) -> U256 {
    U256::from(multiple) * U256::from(10u64).pow(U256::from(18))
}

#[tokio::test]
async fn collect_keeps_only_positive_amounts_in_each_category() {
    let gateway = Arc::new(MockGateway::new());
    let config_ve_dist = Address::repeat_byte(0x03);

    // Pair A earns in every category; pair B answers zero everywhere.
    gateway.script_u256(GAUGE_A, IGauge::earnedCall::SELECTOR, one_ether(2));
    gateway.script_u256(
        PAIR_A,
        IPair::claimable0Call::SELECTOR,
        U256::from(500_000_000_000_000_000u128),
    );
    gateway.script(
        BRIBE_A,
        IBribe::tokenIdToAddressCall::SELECTOR,
        Address::repeat_byte(0xee).abi_encode().into(),
    );
    gateway.script_u256(BRIBE_A, IBribe::rewardTokensLengthCall::SELECTOR, U256::ONE);
    gateway.script(
        BRIBE_A,
        IBribe::rewardTokensCall::SELECTOR,
        BRIBE_TOKEN.abi_encode().into(),
    );
    gateway.script_u256(BRIBE_A, IBribe::earnedCall::SELECTOR, one_ether(3));
    gateway.script_u256(config_ve_dist, IVeDist::claimableCall::SELECTOR, one_ether(4));

    let ctx = seeded_context(gateway);
    let mut rx = ctx.bus.subscribe();
    rewards::collect(&ctx, 7).await.expect("collect");

    let bundle = ctx.state.snapshot().rewards;

    assert_eq!(bundle.bribes.len(), 1);
    assert_eq!(bundle.bribes[0].address, PAIR_A);
    assert_eq!(bundle.bribes[0].reward_type, Some(RewardType::Bribe));
    let earned = &bundle.bribes[0].gauge.as_ref().unwrap().bribes_earned;
    assert_eq!(earned.len(), 1);
    assert!(earned[0].token.same_address(&format!("{:#x}", BRIBE_TOKEN)));
    assert_eq!(earned[0].earned, "3.000000000000000000");

    assert_eq!(bundle.fees.len(), 1);
    assert_eq!(bundle.fees[0].address, PAIR_A);
    assert_eq!(bundle.fees[0].claimable0, "0.500000000000000000");
    assert_eq!(bundle.fees[0].reward_type, Some(RewardType::Fees));

    assert_eq!(bundle.rewards.len(), 1);
    assert_eq!(bundle.rewards[0].address, PAIR_A);
    let reward_tokens = &bundle.rewards[0].gauge.as_ref().unwrap().reward_tokens;
    assert_eq!(reward_tokens[0].rewards_earned, "2.000000000000000000");
    assert_eq!(reward_tokens[0].token.symbol, "CONE");

    assert_eq!(bundle.ve_dist.len(), 1);
    assert_eq!(bundle.ve_dist[0].lock.id, 7);
    assert_eq!(bundle.ve_dist[0].earned, "4.000000000000000000");

    let completed: Vec<ActionKind> = support::drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            StoreEvent::ActionCompleted(kind) => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![ActionKind::CollectRewards]);
}

#[tokio::test]
async fn bribes_are_skipped_without_a_selected_lock() {
    let gateway = Arc::new(MockGateway::new());
    gateway.script_u256(BRIBE_A, IBribe::rewardTokensLengthCall::SELECTOR, U256::ONE);
    gateway.script(
        BRIBE_A,
        IBribe::rewardTokensCall::SELECTOR,
        BRIBE_TOKEN.abi_encode().into(),
    );
    gateway.script_u256(BRIBE_A, IBribe::earnedCall::SELECTOR, one_ether(3));

    let ctx = seeded_context(gateway);
    rewards::collect(&ctx, 0).await.expect("collect");
    assert!(ctx.state.snapshot().rewards.bribes.is_empty());
}

#[tokio::test]
async fn claim_all_runs_bribes_fees_rewards_then_distributions() {
    let gateway = Arc::new(MockGateway::new());
    let ctx = seeded_context(gateway.clone());
    let voter = ctx.config.voter;
    let ve_dist = ctx.config.ve_dist;

    let mut bribed = pair(PAIR_A, "vAMM-A", Some((GAUGE_A, BRIBE_A)));
    bribed.reward_type = Some(RewardType::Bribe);
    bribed.gauge.as_mut().unwrap().bribes_earned = vec![BribeEarned {
        token: asset(&format!("{:#x}", BRIBE_TOKEN), "BRB"),
        earned: "3.0".to_string(),
    }];
    ctx.state.apply(|s| {
        s.rewards = RewardBundle {
            bribes: vec![bribed.clone()],
            fees: vec![pair(PAIR_A, "vAMM-A", None)],
            rewards: vec![pair(PAIR_A, "vAMM-A", Some((GAUGE_A, BRIBE_A)))],
            ve_dist: vec![DistributionClaim {
                lock: lock(7),
                reward_token: asset(&format!("{:#x}", ctx.config.gov_token), "CONE"),
                earned: "4.0".to_string(),
            }],
        };
    });
    let mut rx = ctx.bus.subscribe();

    rewards::claim_all(&ctx, 7).await.expect("claim all");

    let sent = gateway.sent.lock().unwrap();
    let targets: Vec<Address> = sent.iter().map(|tx| tx.to).collect();
    assert_eq!(targets, vec![voter, PAIR_A, GAUGE_A, ve_dist]);

    let bribes_call = IVoter::claimBribesCall::abi_decode(&sent[0].data).expect("claimBribes");
    assert_eq!(bribes_call.bribes, vec![BRIBE_A]);
    assert_eq!(bribes_call.tokens, vec![vec![BRIBE_TOKEN]]);
    assert_eq!(bribes_call.tokenId, U256::from(7));

    let staged = support::drain(&mut rx).into_iter().find_map(|event| match event {
        StoreEvent::TxQueued { steps, .. } => Some(steps),
        _ => None,
    });
    let descriptions: Vec<String> = staged
        .expect("queued batch")
        .into_iter()
        .map(|step| step.description)
        .collect();
    assert_eq!(
        descriptions,
        vec![
            "Claim all bribes",
            "Claim fees for vAMM-A",
            "Claim rewards for vAMM-A",
            "Claim distribution for lock #7",
        ]
    );
}

#[tokio::test]
async fn positionless_pairs_stay_out_of_fee_and_reward_scans() {
    let gateway = Arc::new(MockGateway::new());
    gateway.script_u256(PAIR_B, IPair::claimable0Call::SELECTOR, one_ether(1));
    gateway.script_u256(GAUGE_B, IGauge::earnedCall::SELECTOR, one_ether(1));

    let ctx = seeded_context(gateway);
    ctx.state.apply(|s| s.pairs[1].user_position = None);

    rewards::collect(&ctx, 0).await.expect("collect");

    let bundle = ctx.state.snapshot().rewards;
    assert!(bundle.fees.is_empty());
    assert!(bundle.rewards.is_empty());
}

#[tokio::test]
async fn every_configured_reward_token_is_read_for_a_gauge() {
    let gateway = Arc::new(MockGateway::new());
    gateway.script_u256(GAUGE_A, IGauge::earnedCall::SELECTOR, one_ether(2));

    let ctx = seeded_context(gateway);
    let gov_address = format!("{:#x}", ctx.config.gov_token);
    ctx.state.apply(|s| {
        s.pairs[0].gauge.as_mut().unwrap().reward_tokens = vec![
            RewardToken {
                token: asset(&gov_address, "CONE"),
                rewards_earned: "0".to_string(),
            },
            RewardToken {
                token: asset(&format!("{:#x}", BRIBE_TOKEN), "BRB"),
                rewards_earned: "0".to_string(),
            },
        ];
    });

    rewards::collect(&ctx, 0).await.expect("collect");

    let bundle = ctx.state.snapshot().rewards;
    assert_eq!(bundle.rewards.len(), 1);
    let reward_tokens = &bundle.rewards[0].gauge.as_ref().unwrap().reward_tokens;
    let symbols: Vec<&str> = reward_tokens
        .iter()
        .map(|rt| rt.token.symbol.as_str())
        .collect();
    assert_eq!(symbols, vec!["CONE", "BRB"]);
    assert!(
        reward_tokens
            .iter()
            .all(|rt| rt.rewards_earned == "2.000000000000000000")
    );
}

#[tokio::test]
async fn a_collect_while_one_is_already_running_is_dropped() {
    let gateway = Arc::new(MockGateway::new());
    let gate = Arc::new(tokio::sync::Semaphore::new(0));
    *gateway.gate.lock().unwrap() = Some(gate.clone());
    let ctx = seeded_context(gateway.clone());
    let mut rx = ctx.bus.subscribe();

    let running = {
        let ctx = ctx.clone();
        tokio::spawn(async move { rewards::collect(&ctx, 7).await })
    };
    // Let the first pass park on its gated reads.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    rewards::collect(&ctx, 7).await.expect("busy no-op");
    assert!(support::drain(&mut rx).iter().all(|event| {
        !matches!(event, StoreEvent::ActionCompleted(ActionKind::CollectRewards))
    }));

    gate.add_permits(10_000);
    running.await.expect("join").expect("first pass");

    let finishes = support::drain(&mut rx)
        .into_iter()
        .filter(|event| {
            matches!(event, StoreEvent::ActionCompleted(ActionKind::CollectRewards))
        })
        .count();
    assert_eq!(finishes, 1);
}

#[tokio::test]
async fn bundle_reward_entries_without_a_gauge_get_no_queue_step() {
    let gateway = Arc::new(MockGateway::new());
    let ctx = seeded_context(gateway.clone());
    ctx.state.apply(|s| {
        s.rewards = RewardBundle {
            bribes: Vec::new(),
            fees: Vec::new(),
            rewards: vec![
                pair(PAIR_B, "vAMM-B", None),
                pair(PAIR_A, "vAMM-A", Some((GAUGE_A, BRIBE_A))),
            ],
            ve_dist: Vec::new(),
        };
    });
    let mut rx = ctx.bus.subscribe();

    rewards::claim_all(&ctx, 7).await.expect("claim all");

    let targets: Vec<Address> = gateway.sent.lock().unwrap().iter().map(|tx| tx.to).collect();
    assert_eq!(targets, vec![GAUGE_A]);

    let steps = support::drain(&mut rx)
        .into_iter()
        .find_map(|event| match event {
            StoreEvent::TxQueued { steps, .. } => Some(steps),
            _ => None,
        })
        .expect("queued batch");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].description, "Claim rewards for vAMM-A");
}

#[tokio::test]
async fn claim_all_with_an_empty_bundle_reports_and_stops() {
    let gateway = Arc::new(MockGateway::new());
    let config = support::test_config(Address::repeat_byte(0xcc));
    let ctx = support::context(config, gateway.clone(), MockIndexer::default());
    let mut rx = ctx.bus.subscribe();

    rewards::claim_all(&ctx, 0).await.expect("no-op claim");

    assert!(gateway.sent.lock().unwrap().is_empty());
    let events = support::drain(&mut rx);
    assert!(matches!(
        &events[0],
        StoreEvent::Error(message) if message == "Nothing to claim"
    ));
    assert!(matches!(
        events[1],
        StoreEvent::ActionCompleted(ActionKind::ClaimAllRewards)
    ));
}
