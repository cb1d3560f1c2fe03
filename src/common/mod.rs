// SPDX-License-Identifier: MIT

pub mod parsing;
