// SPDX-License-Identifier: MIT

pub mod assets;
pub mod rewards;
pub mod store;
pub mod swap;
pub mod tx;
pub mod vest;
pub mod votes;
pub mod whitelist;
