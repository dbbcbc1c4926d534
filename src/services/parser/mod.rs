//! Per-chain payload parsing.
//!
//! A [`ChainParser`] turns validated provider payloads into normalized
//! [`TransferTx`] records and related entities. Parsers are pure: no I/O,
//! no clocks beyond the timestamps inside the payload. Amounts always come
//! out as exact decimals; the base-unit exponent is taken from the static
//! chain configuration and applied exactly once.

pub mod blockbook;
pub mod oklink;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::models::{Balance, ChainConfig, ContractInfo, ContractMap, TransferTx, TxOutput};
use crate::services::validator::ResponseValidator;

pub use blockbook::BlockbookParser;
pub use oklink::OkLinkParser;

/// Normalization of one provider dialect for one chain.
pub trait ChainParser: Send + Sync {
	/// Static configuration of the chain this parser serves.
	fn config(&self) -> &'static ChainConfig;

	/// The validator matching this parser's dialect.
	fn validator(&self) -> &dyn ResponseValidator;

	/// Current head height from a block-head payload.
	fn parse_block_head(&self, raw: &Value) -> Option<u64>;

	/// Main coin balance of `address`.
	fn parse_balance(&self, address: &str, raw: &Value) -> Option<Balance>;

	/// Main coin balances from a multi-address payload.
	fn parse_balances(&self, _raw: &Value) -> Vec<Balance> {
		Vec::new()
	}

	/// Token balance of `address` for `contract`.
	fn parse_token_balance(
		&self,
		_address: &str,
		_contract: &ContractInfo,
		_raw: &Value,
	) -> Option<Balance> {
		None
	}

	/// Token balances from a multi-address payload, matched against the
	/// contract registry.
	fn parse_token_balances(&self, _contracts: &ContractMap, _raw: &Value) -> Vec<Balance> {
		Vec::new()
	}

	/// Transfers of one transaction. Empty output means the transaction
	/// could not be normalized; the facade turns that into a failed detail.
	fn parse_tx_details(&self, raw: &Value, block_head: Option<u64>) -> Vec<TransferTx>;

	/// UTXO input and output sides of one transaction.
	fn parse_tx_io(&self, _raw: &Value) -> (Vec<TxOutput>, Vec<TxOutput>) {
		(Vec::new(), Vec::new())
	}

	/// Transfers from an address transaction listing. Malformed entries
	/// are skipped, valid ones survive.
	fn parse_address_txs(&self, address: &str, raw: &Value, block_head: Option<u64>)
		-> Vec<TransferTx>;

	/// Transfers from a token transaction listing for `contract`.
	fn parse_token_txs(
		&self,
		_address: &str,
		_contract: &ContractInfo,
		_raw: &Value,
		_block_head: Option<u64>,
	) -> Vec<TransferTx> {
		Vec::new()
	}

	/// Transfers from one page of a block transaction listing. Failed
	/// transactions come out with `success == false` so downstream can
	/// still count their participants.
	fn parse_block_txs(&self, raw: &Value) -> Vec<TransferTx>;

	/// Total page count of a paged block listing, derived from the first
	/// page's payload.
	fn page_count(&self, _raw: &Value) -> u32 {
		1
	}
}

/// Reads a field that providers serve either as a string or a number.
pub(crate) fn field_as_u64(value: &Value, key: &str) -> Option<u64> {
	match value.get(key)? {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// Millisecond epoch timestamps, as served by OkLink.
pub(crate) fn millis_to_datetime(raw: &str) -> Option<DateTime<Utc>> {
	let millis = raw.trim().parse::<i64>().ok()?;
	Utc.timestamp_millis_opt(millis).single()
}

/// Second epoch timestamps, as served by Blockbook.
pub(crate) fn secs_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
	Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_field_as_u64_accepts_both_shapes() {
		let value = json!({"a": "38301393", "b": 38301393, "c": "x", "d": null});
		assert_eq!(field_as_u64(&value, "a"), Some(38301393));
		assert_eq!(field_as_u64(&value, "b"), Some(38301393));
		assert_eq!(field_as_u64(&value, "c"), None);
		assert_eq!(field_as_u64(&value, "d"), None);
		assert_eq!(field_as_u64(&value, "missing"), None);
	}

	#[test]
	fn test_millis_to_datetime() {
		let date = millis_to_datetime("1701074236000").unwrap();
		assert_eq!(date.timestamp(), 1701074236);
		assert!(millis_to_datetime("not a number").is_none());
	}

	#[test]
	fn test_secs_to_datetime() {
		let date = secs_to_datetime(1701074236).unwrap();
		assert_eq!(date.timestamp(), 1701074236);
	}
}
