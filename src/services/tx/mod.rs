// SPDX-License-Identifier: MIT

pub mod allowance;
pub mod batch;
pub mod lifecycle;
