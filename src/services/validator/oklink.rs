//! OkLink response validation.
//!
//! OkLink wraps every payload in `{"code": "...", "msg": "...", "data": [...]}`.
//! A response is only considered at all when `code == "0"` and `data` is a
//! non-empty array. Transaction-level predicates encode the quirks of the
//! explorer: plain value transfers carry an empty `methodId`, token transfers
//! of the ERC-20 `transfer` selector must resolve to exactly one token
//! movement or the transaction is rejected as ambiguous.

use serde_json::Value;

use crate::models::{parse_amount, ChainConfig, ContractInfo};
use crate::services::validator::{str_field, ResponseValidator};

/// ERC-20 `transfer(address,uint256)` selector.
pub const TOKEN_TRANSFER_METHOD: &str = "0xa9059cbb";

/// Validator for OkLink explorer payloads.
pub struct OkLinkValidator {
	config: &'static ChainConfig,
}

impl OkLinkValidator {
	pub fn new(config: &'static ChainConfig) -> Self {
		Self { config }
	}

	fn data_array<'a>(raw: &'a Value) -> Option<&'a Vec<Value>> {
		raw.get("data").and_then(Value::as_array)
	}

	fn general_ok(&self, raw: &Value) -> bool {
		str_field(raw, "code") == "0"
			&& Self::data_array(raw).map(|data| !data.is_empty()).unwrap_or(false)
	}

	fn first_entry<'a>(raw: &'a Value) -> Option<&'a Value> {
		Self::data_array(raw).and_then(|data| data.first())
	}

	/// Accepts one entry of a transaction listing as a plain value transfer.
	pub fn transaction_ok(&self, tx: &Value) -> bool {
		let from = str_field(tx, "from");
		let to = str_field(tx, "to");
		if from.is_empty() || to.is_empty() || from.eq_ignore_ascii_case(to) {
			return false;
		}
		if !str_field(tx, "methodId").is_empty() {
			return false;
		}
		if !str_field(tx, "tokenContractAddress").is_empty() {
			return false;
		}
		if str_field(tx, "isFromContract") == "true" || str_field(tx, "isToContract") == "true" {
			return false;
		}
		if str_field(tx, "state") != "success" {
			return false;
		}
		match parse_amount(str_field(tx, "amount")) {
			Ok(amount) => amount >= self.config.min_valid_tx_amount,
			Err(_) => false,
		}
	}

	/// Accepts one entry of an address listing; challenged transactions
	/// (optimistic rollup style) are rejected.
	pub fn address_transaction_ok(&self, tx: &Value) -> bool {
		self.transaction_ok(tx) && str_field(tx, "challengeStatus").is_empty()
	}

	/// Accepts one entry of a token transaction listing for `contract`.
	pub fn token_transaction_ok(&self, tx: &Value, contract: &ContractInfo) -> bool {
		let from = str_field(tx, "from");
		let to = str_field(tx, "to");
		if from.is_empty() || to.is_empty() || from.eq_ignore_ascii_case(to) {
			return false;
		}
		if !str_field(tx, "tokenContractAddress").eq_ignore_ascii_case(&contract.address) {
			return false;
		}
		if str_field(tx, "state") != "success" {
			return false;
		}
		if !str_field(tx, "challengeStatus").is_empty() {
			return false;
		}
		parse_amount(str_field(tx, "amount")).is_ok()
	}

	/// Accepts a transaction-detail payload.
	///
	/// A detail with the token transfer selector must carry exactly one
	/// entry in `tokenTransferDetails`; zero entries means the transfer
	/// cannot be reconstructed and more than one means picking would be
	/// arbitrary. Either way the payload is rejected.
	pub fn tx_details_ok(&self, raw: &Value) -> bool {
		if !self.general_ok(raw) {
			return false;
		}
		let tx = match Self::first_entry(raw) {
			Some(tx) => tx,
			None => return false,
		};
		if str_field(tx, "state") != "success" {
			return false;
		}

		let method = str_field(tx, "methodId");
		if method == TOKEN_TRANSFER_METHOD {
			let transfers = match tx.get("tokenTransferDetails").and_then(Value::as_array) {
				Some(transfers) => transfers,
				None => return false,
			};
			if transfers.len() != 1 {
				return false;
			}
			let transfer = &transfers[0];
			let from = str_field(transfer, "from");
			let to = str_field(transfer, "to");
			!from.is_empty() && !to.is_empty() && !from.eq_ignore_ascii_case(to)
		} else if !method.is_empty() {
			// Arbitrary contract calls are not value transfers
			false
		} else {
			if !str_field(tx, "tokenContractAddress").is_empty() {
				return false;
			}
			let from = tx
				.pointer("/inputDetails/0/inputHash")
				.and_then(Value::as_str)
				.unwrap_or("");
			let to = tx
				.pointer("/outputDetails/0/outputHash")
				.and_then(Value::as_str)
				.unwrap_or("");
			!from.is_empty() && !to.is_empty() && !from.eq_ignore_ascii_case(to)
		}
	}
}

impl ResponseValidator for OkLinkValidator {
	fn validate_general(&self, raw: &Value) -> bool {
		self.general_ok(raw)
	}

	fn validate_balance(&self, raw: &Value) -> bool {
		self.general_ok(raw)
			&& Self::first_entry(raw)
				.map(|entry| !str_field(entry, "balance").is_empty())
				.unwrap_or(false)
	}

	fn validate_balances(&self, raw: &Value) -> bool {
		self.general_ok(raw)
			&& Self::first_entry(raw)
				.and_then(|entry| entry.get("balanceList"))
				.and_then(Value::as_array)
				.map(|list| !list.is_empty())
				.unwrap_or(false)
	}

	fn validate_token_balance(&self, raw: &Value) -> bool {
		self.general_ok(raw)
			&& Self::first_entry(raw)
				.and_then(|entry| entry.get("tokenList"))
				.and_then(Value::as_array)
				.map(|list| !list.is_empty())
				.unwrap_or(false)
	}

	fn validate_token_balances(&self, raw: &Value) -> bool {
		self.validate_balances(raw)
	}

	fn validate_tx_details(&self, raw: &Value) -> bool {
		self.tx_details_ok(raw)
	}

	fn validate_address_txs(&self, raw: &Value) -> bool {
		self.general_ok(raw)
			&& Self::first_entry(raw)
				.and_then(|entry| entry.get("transactionLists"))
				.and_then(Value::as_array)
				.is_some()
	}

	fn validate_token_txs(&self, raw: &Value) -> bool {
		self.validate_address_txs(raw)
	}

	fn validate_block_txs(&self, raw: &Value) -> bool {
		self.general_ok(raw)
			&& Self::first_entry(raw)
				.and_then(|entry| entry.get("transactionList"))
				.and_then(Value::as_array)
				.is_some()
	}

	fn validate_block_head(&self, raw: &Value) -> bool {
		self.general_ok(raw)
			&& Self::first_entry(raw)
				.map(|entry| !str_field(entry, "lastHeight").is_empty())
				.unwrap_or(false)
	}
}
