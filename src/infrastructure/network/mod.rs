// SPDX-License-Identifier: MIT

pub mod abi;
pub mod gateway;
pub mod multicall;
pub mod provider;
pub mod subgraph;
