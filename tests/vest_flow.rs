// SPDX-License-Identifier: MIT
// Vote-escrow lock management: the allowance gate on lock creation, the
// self-merge guard, and on-chain lock enumeration.

mod support;

use alloy::primitives::{Address, I256, U256};
use alloy_sol_types::{SolCall, SolValue};
use std::sync::Arc;
use support::{MockGateway, MockIndexer};
use vedex::domain::error::AppError;
use vedex::domain::model::{Asset, Gauge, Pair};
use vedex::infrastructure::network::abi::{IErc20, IVoter, IVotingEscrow};
use vedex::services::vest;

fn gauge_pair(address: Address) -> Pair {
    let token = |tag: &str| Asset {
        address: format!("0x00000000000000000000000000000000000000{tag}"),
        symbol: tag.to_uppercase(),
        name: tag.to_uppercase(),
        decimals: 18,
        logo_uri: None,
        balance: "0".to_string(),
        is_whitelisted: true,
        local: false,
    };
    Pair {
        address,
        symbol: "vAMM-A/B".to_string(),
        stable: false,
        token0: token("a0"),
        token1: token("b0"),
        reserve0: "1".to_string(),
        reserve1: "1".to_string(),
        total_supply: "1".to_string(),
        user_position: None,
        claimable0: "0".to_string(),
        claimable1: "0".to_string(),
        gauge: Some(Gauge {
            address: Address::repeat_byte(0xe1),
            bribe_address: Address::repeat_byte(0xe2),
            total_supply: "0".to_string(),
            user_balance: "0".to_string(),
            reward_tokens: Vec::new(),
            bribes_earned: Vec::new(),
        }),
        reward_type: None,
    }
}

#[tokio::test]
async fn create_lock_approves_the_escrow_then_locks() {
    let gateway = Arc::new(MockGateway::new());
    let ctx = support::context(
        support::test_config(Address::repeat_byte(0xcc)),
        gateway.clone(),
        MockIndexer::default(),
    );

    vest::create_lock(&ctx, "100", 4 * 365 * 86_400)
        .await
        .expect("create lock");

    let sent = gateway.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, ctx.config.gov_token);
    let approve = IErc20::approveCall::abi_decode(&sent[0].data).expect("approve");
    assert_eq!(approve.spender, ctx.config.ve_token);

    assert_eq!(sent[1].to, ctx.config.ve_token);
    let create = IVotingEscrow::createLockCall::abi_decode(&sent[1].data).expect("createLock");
    assert_eq!(create.value, U256::from(100u64) * U256::from(10u64).pow(U256::from(18)));
    assert_eq!(create.lockDuration, U256::from(4u64 * 365 * 86_400));
}

#[tokio::test]
async fn merging_a_lock_into_itself_is_rejected() {
    let gateway = Arc::new(MockGateway::new());
    let ctx = support::context(
        support::test_config(Address::repeat_byte(0xcc)),
        gateway.clone(),
        MockIndexer::default(),
    );

    let err = vest::merge_locks(&ctx, 5, 5).await.expect_err("rejected");
    assert!(matches!(err, AppError::Validation { field, .. } if field == "to_token_id"));
    assert!(gateway.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn load_locks_reads_amount_end_and_voting_power() {
    let gateway = Arc::new(MockGateway::new());
    let config = support::test_config(Address::repeat_byte(0xcc));
    let ve_token = config.ve_token;
    gateway.script_u256(ve_token, IVotingEscrow::balanceOfCall::SELECTOR, U256::ONE);
    gateway.script_u256(
        ve_token,
        IVotingEscrow::tokenOfOwnerByIndexCall::SELECTOR,
        U256::from(7u64),
    );
    gateway.script(
        ve_token,
        IVotingEscrow::lockedCall::SELECTOR,
        (5_000_000_000_000_000_000i128, U256::from(123_456u64))
            .abi_encode()
            .into(),
    );
    gateway.script_u256(
        ve_token,
        IVotingEscrow::balanceOfNFTCall::SELECTOR,
        U256::from(2_500_000_000_000_000_000u128),
    );
    let ctx = support::context(config, gateway, MockIndexer::default());

    vest::load_locks(&ctx).await.expect("load locks");

    let locks = ctx.state.snapshot().locks;
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].id, 7);
    assert_eq!(locks[0].lock_ends, 123_456);
    assert_eq!(locks[0].lock_amount, "5.000000000000000000");
    assert_eq!(locks[0].lock_value, "2.500000000000000000");
}

#[tokio::test]
async fn withdraw_resets_live_votes_before_withdrawing() {
    let gateway = Arc::new(MockGateway::new());
    let voter = Address::repeat_byte(0x02);
    gateway.script(
        voter,
        IVoter::votesCall::SELECTOR,
        I256::unchecked_from(100).abi_encode().into(),
    );
    let ctx = support::context(
        support::test_config(Address::repeat_byte(0xcc)),
        gateway.clone(),
        MockIndexer::default(),
    );
    ctx.state
        .apply(|s| s.pairs = vec![gauge_pair(Address::repeat_byte(0xa1))]);

    vest::withdraw_lock(&ctx, 7).await.expect("withdraw");

    let sent = gateway.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, voter);
    let reset = IVoter::resetCall::abi_decode(&sent[0].data).expect("reset");
    assert_eq!(reset.tokenId, U256::from(7));
    assert_eq!(sent[1].to, ctx.config.ve_token);
    assert!(IVotingEscrow::withdrawCall::abi_decode(&sent[1].data).is_ok());
}

#[tokio::test]
async fn withdraw_without_votes_skips_the_reset_step() {
    let gateway = Arc::new(MockGateway::new());
    let ctx = support::context(
        support::test_config(Address::repeat_byte(0xcc)),
        gateway.clone(),
        MockIndexer::default(),
    );
    ctx.state
        .apply(|s| s.pairs = vec![gauge_pair(Address::repeat_byte(0xa1))]);

    vest::withdraw_lock(&ctx, 7).await.expect("withdraw");

    let sent = gateway.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ctx.config.ve_token);
}

#[tokio::test]
async fn an_account_without_locks_loads_an_empty_set() {
    let gateway = Arc::new(MockGateway::new());
    let ctx = support::context(
        support::test_config(Address::repeat_byte(0xcc)),
        gateway,
        MockIndexer::default(),
    );

    vest::load_locks(&ctx).await.expect("load locks");
    assert!(ctx.state.snapshot().locks.is_empty());
}
