//! Response validation.
//!
//! Validators are pure predicates over raw provider payloads. Every logical
//! operation has its own predicate and every predicate defaults to `false`:
//! a provider response is rejected unless a validator explicitly accepts it.
//! Rejection means the parser is never invoked for that payload.

pub mod blockbook;
pub mod oklink;

use serde_json::Value;

pub use blockbook::BlockbookValidator;
pub use oklink::OkLinkValidator;

/// Per-operation payload acceptance. Everything defaults to rejection.
pub trait ResponseValidator: Send + Sync {
	fn validate_general(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_balance(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_balances(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_token_balance(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_token_balances(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_tx_details(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_address_txs(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_token_txs(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_block_txs(&self, _raw: &Value) -> bool {
		false
	}

	fn validate_block_head(&self, _raw: &Value) -> bool {
		false
	}
}

/// String field accessor tolerating absent and non-string values.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
	value.get(key).and_then(Value::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	struct Defaults;
	impl ResponseValidator for Defaults {}

	#[test]
	fn test_everything_rejected_by_default() {
		let validator = Defaults;
		let payload = json!({"code": "0", "data": [{}]});
		assert!(!validator.validate_general(&payload));
		assert!(!validator.validate_balance(&payload));
		assert!(!validator.validate_balances(&payload));
		assert!(!validator.validate_token_balance(&payload));
		assert!(!validator.validate_token_balances(&payload));
		assert!(!validator.validate_tx_details(&payload));
		assert!(!validator.validate_address_txs(&payload));
		assert!(!validator.validate_token_txs(&payload));
		assert!(!validator.validate_block_txs(&payload));
		assert!(!validator.validate_block_head(&payload));
	}

	#[test]
	fn test_str_field() {
		let value = json!({"a": "x", "b": 3});
		assert_eq!(str_field(&value, "a"), "x");
		assert_eq!(str_field(&value, "b"), "");
		assert_eq!(str_field(&value, "missing"), "");
	}
}
