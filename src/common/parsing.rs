// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use alloy::primitives::U256;
use alloy::primitives::utils::{format_units, parse_units};
use alloy_sol_types::SolValue;

/// Format a raw on-chain amount as a decimal string with `decimals` places.
pub fn format_bn(raw: U256, decimals: u8) -> String {
    format_units(raw, decimals).unwrap_or_else(|_| "0".to_string())
}

/// Parse a user-facing decimal string into a raw on-chain amount.
pub fn parse_bn(value: &str, decimals: u8) -> Result<U256, AppError> {
    let parsed = parse_units(value.trim(), decimals).map_err(|e| AppError::Validation {
        field: "amount".to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed.get_absolute())
}

/// True when a decimal string holds a strictly positive value.
pub fn is_positive(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.starts_with('-') && trimmed.chars().any(|c| c.is_ascii_digit() && c != '0')
}

pub fn lowercase_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Decode a single uint256 return value, reading garbage as zero. Batched
/// reads treat an undecodable slot as an empty balance rather than failing
/// the whole refresh.
pub fn decode_u256(raw: &[u8]) -> U256 {
    <U256 as SolValue>::abi_decode(raw).unwrap_or(U256::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_and_parse_roundtrip() {
        let raw = parse_bn("1.5", 18).expect("parse");
        assert_eq!(raw, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(format_bn(raw, 18), "1.500000000000000000");
    }

    #[test]
    fn is_positive_rejects_zero_and_negative() {
        assert!(is_positive("1.5"));
        assert!(is_positive("0.000001"));
        assert!(!is_positive("0"));
        assert!(!is_positive("0.000"));
        assert!(!is_positive("-3"));
        assert!(!is_positive(""));
    }

    #[test]
    fn lowercase_eq_ignores_hex_casing() {
        assert!(lowercase_eq("0xAbC", "0xaBc"));
        assert!(!lowercase_eq("0xAbC", "0xaBd"));
    }
}
