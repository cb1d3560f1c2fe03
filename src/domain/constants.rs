// SPDX-License-Identifier: MIT

use alloy::primitives::{Address, address};

// =============================================================================
// BATCHING & GAS CONSTANTS
// =============================================================================

/// Hard ceiling on calls bundled into one multicall request. Public BSC
/// endpoints start truncating responses somewhere between 30 and 50 calls,
/// so the accumulator flushes as soon as a batch exceeds this.
pub const MULTICALL_BATCH_CEILING: usize = 30;

/// Gas estimates are multiplied by 3/2 before submission to absorb
/// execution-path variance between estimation and inclusion.
pub const GAS_MARGIN_NUM: u64 = 3;
pub const GAS_MARGIN_DEN: u64 = 2;

pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Swap deadline window, seconds from submission.
pub const SWAP_DEADLINE_SECS: u64 = 600;

// =============================================================================
// NATIVE ASSET
// =============================================================================

/// Placeholder address for the chain-native asset in the asset list.
/// The native asset has no ERC-20 contract; balance reads go through
/// `eth_getBalance` and swaps through the native router entrypoints.
pub const NATIVE_ADDRESS: &str = "BNB";
pub const NATIVE_SYMBOL: &str = "BNB";
pub const NATIVE_NAME: &str = "Binance Coin";
pub const NATIVE_DECIMALS: u8 = 18;

// =============================================================================
// PROTOCOL CONTRACTS (BSC mainnet defaults, overridable via config)
// =============================================================================

pub const CHAIN_BSC: u64 = 56;

pub const GOV_TOKEN: Address = address!("A60205802E1B5C6EC1CAFA3cAcd49dFeECe05AC9");
pub const GOV_TOKEN_SYMBOL: &str = "CONE";
pub const GOV_TOKEN_NAME: &str = "Cone";
pub const GOV_TOKEN_DECIMALS: u8 = 18;

pub const VE_TOKEN: Address = address!("d0C1378c177E961D96c06b0E8F6E7841476C81Ef");
pub const VE_TOKEN_SYMBOL: &str = "veCONE";
pub const VE_TOKEN_NAME: &str = "veCONE";
pub const VE_TOKEN_DECIMALS: u8 = 18;

pub const ROUTER: Address = address!("d3B02Ff30c218c7f7756BA14bcA075Bf7C2C951e");
pub const VOTER: Address = address!("C3B5d80E4c094B17603Ea8Bb15d2D31ff5954aAE");
pub const VE_DIST: Address = address!("eB63c968b9FFA0ee2DC4b2F10c1e5f62b74c4F8B");
pub const WRAPPED_NATIVE: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
pub const MULTICALL: Address = address!("fF6FD90A470Aaa0c1B8A54681746b07AcdFedc9B");
