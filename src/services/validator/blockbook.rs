//! Blockbook response validation.
//!
//! Blockbook returns bare JSON objects without an envelope; errors show up
//! as an `error` key. Transaction payloads must carry vin/vout arrays or
//! there is nothing to net amounts from.

use serde_json::Value;

use crate::models::ChainConfig;
use crate::services::validator::{str_field, ResponseValidator};

/// Validator for Blockbook payloads.
pub struct BlockbookValidator {
	#[allow(dead_code)]
	config: &'static ChainConfig,
}

impl BlockbookValidator {
	pub fn new(config: &'static ChainConfig) -> Self {
		Self { config }
	}

	fn general_ok(raw: &Value) -> bool {
		raw.is_object() && raw.get("error").is_none()
	}

	/// Accepts one transaction object, standalone or inside a listing.
	pub fn transaction_ok(&self, tx: &Value) -> bool {
		if str_field(tx, "txid").is_empty() {
			return false;
		}
		let vin_ok = tx
			.get("vin")
			.and_then(Value::as_array)
			.map(|vin| !vin.is_empty())
			.unwrap_or(false);
		let vout_ok = tx
			.get("vout")
			.and_then(Value::as_array)
			.map(|vout| !vout.is_empty())
			.unwrap_or(false);
		vin_ok && vout_ok
	}
}

impl ResponseValidator for BlockbookValidator {
	fn validate_general(&self, raw: &Value) -> bool {
		Self::general_ok(raw)
	}

	fn validate_balance(&self, raw: &Value) -> bool {
		Self::general_ok(raw) && !str_field(raw, "balance").is_empty()
	}

	fn validate_tx_details(&self, raw: &Value) -> bool {
		Self::general_ok(raw) && self.transaction_ok(raw)
	}

	fn validate_address_txs(&self, raw: &Value) -> bool {
		Self::general_ok(raw)
			&& raw
				.get("transactions")
				.map(|txs| txs.is_array())
				.unwrap_or(false)
	}

	fn validate_block_txs(&self, raw: &Value) -> bool {
		Self::general_ok(raw) && raw.get("txs").map(|txs| txs.is_array()).unwrap_or(false)
	}

	fn validate_block_head(&self, raw: &Value) -> bool {
		Self::general_ok(raw)
			&& raw
				.pointer("/blockbook/bestHeight")
				.and_then(Value::as_u64)
				.is_some()
	}
}
