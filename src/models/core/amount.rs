//! Exact decimal amounts.
//!
//! Providers report amounts either in human units ("1.432361") or in integer
//! base units ("1324930" satoshi). Both forms are turned into
//! [`rust_decimal::Decimal`] values here. Base-unit scaling divides by
//! 10^decimals exactly once; the exponent always comes from the static chain
//! configuration, never from the payload.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Largest scale `Decimal` can represent.
const MAX_SCALE: u32 = 28;

/// Errors raised while converting provider amount strings.
#[derive(Debug, Error)]
pub enum AmountError {
	/// The string is not a valid number, or does not fit a `Decimal`
	#[error("invalid amount string: {0}")]
	InvalidAmount(String),

	/// Negative amounts never appear in provider payloads we accept
	#[error("negative amount: {0}")]
	NegativeAmount(String),

	/// The chain's decimal exponent exceeds `Decimal` precision
	#[error("unsupported decimal scale: {0}")]
	UnsupportedScale(u32),
}

/// Converts an integer base-unit string into a human-unit decimal.
///
/// `from_base_units("1324930", 8)` yields `0.01324930`.
pub fn from_base_units(raw: &str, decimals: u32) -> Result<Decimal, AmountError> {
	if decimals > MAX_SCALE {
		return Err(AmountError::UnsupportedScale(decimals));
	}
	let raw = raw.trim();
	let units = raw
		.parse::<i128>()
		.map_err(|_| AmountError::InvalidAmount(raw.to_string()))?;
	if units < 0 {
		return Err(AmountError::NegativeAmount(raw.to_string()));
	}
	Decimal::try_from_i128_with_scale(units, decimals)
		.map_err(|_| AmountError::InvalidAmount(raw.to_string()))
}

/// Parses a human-unit decimal string as reported by the provider.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
	let raw = raw.trim();
	let amount = Decimal::from_str(raw).map_err(|_| AmountError::InvalidAmount(raw.to_string()))?;
	if amount.is_sign_negative() {
		return Err(AmountError::NegativeAmount(raw.to_string()));
	}
	Ok(amount)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_from_base_units_scales_once() {
		let amount = from_base_units("1324930", 8).unwrap();
		assert_eq!(amount, Decimal::from_str("0.01324930").unwrap());
		assert_eq!(amount.to_string(), "0.01324930");
	}

	#[test]
	fn test_from_base_units_zero_decimals() {
		let amount = from_base_units("42", 0).unwrap();
		assert_eq!(amount, Decimal::from(42));
	}

	#[test]
	fn test_from_base_units_rejects_garbage() {
		assert!(matches!(
			from_base_units("0x123", 8),
			Err(AmountError::InvalidAmount(_))
		));
		assert!(matches!(
			from_base_units("1.5", 8),
			Err(AmountError::InvalidAmount(_))
		));
		assert!(matches!(
			from_base_units("-7", 8),
			Err(AmountError::NegativeAmount(_))
		));
		assert!(matches!(
			from_base_units("1", 40),
			Err(AmountError::UnsupportedScale(40))
		));
	}

	#[test]
	fn test_parse_amount() {
		assert_eq!(
			parse_amount("1.432361").unwrap(),
			Decimal::from_str("1.432361").unwrap()
		);
		assert_eq!(parse_amount(" 499 ").unwrap(), Decimal::from(499));
		assert!(matches!(
			parse_amount("-1"),
			Err(AmountError::NegativeAmount(_))
		));
		assert!(matches!(
			parse_amount("abc"),
			Err(AmountError::InvalidAmount(_))
		));
	}

	proptest! {
		// The mantissa and scale of the result must reproduce the input
		// exactly, so no precision is lost for any base-unit value.
		#[test]
		fn prop_base_units_are_exact(units in 0u64..=u64::MAX, decimals in 0u32..=18) {
			let amount = from_base_units(&units.to_string(), decimals).unwrap();
			prop_assert_eq!(amount.mantissa(), units as i128);
			prop_assert_eq!(amount.scale(), decimals);
		}
	}
}
