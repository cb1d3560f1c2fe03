// SPDX-License-Identifier: MIT

pub mod app;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use infrastructure::data;
pub use infrastructure::network;
pub use services::store;
