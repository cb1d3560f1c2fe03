// SPDX-License-Identifier: MIT

pub mod local_assets;
