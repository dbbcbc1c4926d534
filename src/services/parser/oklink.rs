//! OkLink parser for account-based chains.
//!
//! OkLink reports amounts in human units already, so no base-unit scaling
//! happens here; values are parsed as-is. Confirmations are computed as
//! `head - height` from the head snapshot taken by the facade, falling back
//! to the provider's own `confirm` field when no snapshot is available.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::models::{
	parse_amount, Balance, ChainConfig, ContractInfo, ContractMap, TransferKind, TransferTx,
};
use crate::services::parser::{field_as_u64, millis_to_datetime, ChainParser};
use crate::services::validator::oklink::{OkLinkValidator, TOKEN_TRANSFER_METHOD};
use crate::services::validator::{str_field, ResponseValidator};

/// Parser for OkLink explorer payloads.
pub struct OkLinkParser {
	config: &'static ChainConfig,
	validator: OkLinkValidator,
}

impl OkLinkParser {
	pub fn new(config: &'static ChainConfig) -> Self {
		Self {
			config,
			validator: OkLinkValidator::new(config),
		}
	}

	fn first_entry<'a>(raw: &'a Value) -> Option<&'a Value> {
		raw.pointer("/data/0")
	}

	fn main_symbol(&self, tx: &Value) -> String {
		let symbol = str_field(tx, "transactionSymbol");
		if symbol.is_empty() {
			self.config.symbol.to_uppercase()
		} else {
			symbol.to_string()
		}
	}

	fn confirmations(&self, tx: &Value, height: Option<u64>, block_head: Option<u64>) -> Option<i64> {
		match (block_head, height) {
			(Some(head), Some(height)) => Some(head as i64 - height as i64),
			_ => str_field(tx, "confirm").trim().parse().ok(),
		}
	}

	/// Common fields of a listing entry; value and addresses differ per
	/// operation and are filled by the caller.
	fn base_transfer(&self, tx: &Value, block_head: Option<u64>) -> TransferTx {
		let height = field_as_u64(tx, "height");
		TransferTx {
			kind: TransferKind::MainCoin,
			tx_hash: str_field(tx, "txid").to_string(),
			success: true,
			from_address: str_field(tx, "from").to_lowercase(),
			to_address: str_field(tx, "to").to_lowercase(),
			value: Decimal::ZERO,
			symbol: self.main_symbol(tx),
			token: None,
			block_height: height,
			block_hash: None,
			date: millis_to_datetime(str_field(tx, "transactionTime")),
			confirmations: self.confirmations(tx, height, block_head),
			tx_fee: parse_amount(str_field(tx, "txFee")).ok(),
			memo: None,
		}
	}
}

impl ChainParser for OkLinkParser {
	fn config(&self) -> &'static ChainConfig {
		self.config
	}

	fn validator(&self) -> &dyn ResponseValidator {
		&self.validator
	}

	fn parse_block_head(&self, raw: &Value) -> Option<u64> {
		Self::first_entry(raw).and_then(|entry| field_as_u64(entry, "lastHeight"))
	}

	fn parse_balance(&self, address: &str, raw: &Value) -> Option<Balance> {
		let entry = Self::first_entry(raw)?;
		let amount = parse_amount(str_field(entry, "balance")).ok()?;
		Some(Balance {
			address: address.to_string(),
			amount,
			symbol: self.config.symbol.to_uppercase(),
			token: None,
			unconfirmed_amount: None,
		})
	}

	fn parse_balances(&self, raw: &Value) -> Vec<Balance> {
		let list = match Self::first_entry(raw)
			.and_then(|entry| entry.get("balanceList"))
			.and_then(Value::as_array)
		{
			Some(list) => list,
			None => return Vec::new(),
		};

		list.iter()
			.filter_map(|entry| {
				let address = str_field(entry, "address");
				if address.is_empty() {
					return None;
				}
				let amount = parse_amount(str_field(entry, "balance")).ok()?;
				Some(Balance {
					address: address.to_lowercase(),
					amount,
					symbol: self.config.symbol.to_uppercase(),
					token: None,
					unconfirmed_amount: None,
				})
			})
			.collect()
	}

	fn parse_token_balance(
		&self,
		address: &str,
		contract: &ContractInfo,
		raw: &Value,
	) -> Option<Balance> {
		let token = Self::first_entry(raw)?
			.get("tokenList")?
			.as_array()?
			.first()?;
		let amount = parse_amount(str_field(token, "holdingAmount")).ok()?;
		Some(Balance {
			address: address.to_string(),
			amount,
			symbol: contract.symbol.clone(),
			token: Some(contract.address.clone()),
			unconfirmed_amount: None,
		})
	}

	fn parse_token_balances(&self, contracts: &ContractMap, raw: &Value) -> Vec<Balance> {
		let list = match Self::first_entry(raw)
			.and_then(|entry| entry.get("balanceList"))
			.and_then(Value::as_array)
		{
			Some(list) => list,
			None => return Vec::new(),
		};

		list.iter()
			.filter_map(|entry| {
				let token_address = str_field(entry, "tokenContractAddress");
				let contract = contracts
					.values()
					.find(|c| c.address.eq_ignore_ascii_case(token_address))?;
				let amount = parse_amount(str_field(entry, "holdingAmount")).ok()?;
				Some(Balance {
					address: str_field(entry, "address").to_lowercase(),
					amount,
					symbol: contract.symbol.clone(),
					token: Some(contract.address.clone()),
					unconfirmed_amount: None,
				})
			})
			.collect()
	}

	fn parse_tx_details(&self, raw: &Value, block_head: Option<u64>) -> Vec<TransferTx> {
		if !self.validator.tx_details_ok(raw) {
			debug!("transaction detail payload rejected");
			return Vec::new();
		}
		// Validated above, data[0] exists
		let tx = match Self::first_entry(raw) {
			Some(tx) => tx,
			None => return Vec::new(),
		};

		let height = field_as_u64(tx, "height");
		let date = millis_to_datetime(str_field(tx, "transactionTime"));
		let confirmations = self.confirmations(tx, height, block_head);
		let tx_fee = parse_amount(str_field(tx, "txfee")).ok();
		let tx_hash = str_field(tx, "txid").to_string();

		if str_field(tx, "methodId") == TOKEN_TRANSFER_METHOD {
			// Exactly one entry, enforced by validation
			let transfer = match tx.pointer("/tokenTransferDetails/0") {
				Some(transfer) => transfer,
				None => return Vec::new(),
			};
			let value = match parse_amount(str_field(transfer, "amount")) {
				Ok(value) => value,
				Err(_) => return Vec::new(),
			};
			vec![TransferTx {
				kind: TransferKind::Token,
				tx_hash,
				success: true,
				from_address: str_field(transfer, "from").to_lowercase(),
				to_address: str_field(transfer, "to").to_lowercase(),
				value,
				symbol: str_field(transfer, "symbol").to_string(),
				token: Some(str_field(transfer, "tokenContractAddress").to_lowercase()),
				block_height: height,
				block_hash: None,
				date,
				confirmations,
				tx_fee,
				memo: None,
			}]
		} else {
			let value = match parse_amount(str_field(tx, "amount")) {
				Ok(value) => value,
				Err(_) => return Vec::new(),
			};
			let from = tx
				.pointer("/inputDetails/0/inputHash")
				.and_then(Value::as_str)
				.unwrap_or("");
			let to = tx
				.pointer("/outputDetails/0/outputHash")
				.and_then(Value::as_str)
				.unwrap_or("");
			vec![TransferTx {
				kind: TransferKind::MainCoin,
				tx_hash,
				success: true,
				from_address: from.to_lowercase(),
				to_address: to.to_lowercase(),
				value,
				symbol: self.main_symbol(tx),
				token: None,
				block_height: height,
				block_hash: None,
				date,
				confirmations,
				tx_fee,
				memo: None,
			}]
		}
	}

	fn parse_address_txs(
		&self,
		_address: &str,
		raw: &Value,
		block_head: Option<u64>,
	) -> Vec<TransferTx> {
		let list = match Self::first_entry(raw)
			.and_then(|entry| entry.get("transactionLists"))
			.and_then(Value::as_array)
		{
			Some(list) => list,
			None => return Vec::new(),
		};

		list.iter()
			.filter(|tx| self.validator.address_transaction_ok(tx))
			.filter_map(|tx| {
				let value = parse_amount(str_field(tx, "amount")).ok()?;
				Some(TransferTx {
					value,
					..self.base_transfer(tx, block_head)
				})
			})
			.collect()
	}

	fn parse_token_txs(
		&self,
		_address: &str,
		contract: &ContractInfo,
		raw: &Value,
		block_head: Option<u64>,
	) -> Vec<TransferTx> {
		let list = match Self::first_entry(raw)
			.and_then(|entry| entry.get("transactionLists"))
			.and_then(Value::as_array)
		{
			Some(list) => list,
			None => return Vec::new(),
		};

		list.iter()
			.filter(|tx| self.validator.token_transaction_ok(tx, contract))
			.filter_map(|tx| {
				let value = parse_amount(str_field(tx, "amount")).ok()?;
				Some(TransferTx {
					kind: TransferKind::Token,
					value,
					symbol: contract.symbol.clone(),
					token: Some(contract.address.clone()),
					..self.base_transfer(tx, block_head)
				})
			})
			.collect()
	}

	fn parse_block_txs(&self, raw: &Value) -> Vec<TransferTx> {
		let list = match Self::first_entry(raw)
			.and_then(|entry| entry.get("transactionList"))
			.and_then(Value::as_array)
		{
			Some(list) => list,
			None => return Vec::new(),
		};

		list.iter()
			.filter_map(|tx| {
				// Entries without an identity are skipped outright; entries
				// that fail the monetary predicate keep their participants
				// but are marked unsuccessful.
				let tx_hash = str_field(tx, "txid");
				let height = field_as_u64(tx, "height")?;
				if tx_hash.is_empty() {
					return None;
				}
				let value = parse_amount(str_field(tx, "amount")).unwrap_or(Decimal::ZERO);
				Some(TransferTx {
					kind: TransferKind::MainCoin,
					tx_hash: tx_hash.to_string(),
					success: self.validator.transaction_ok(tx),
					from_address: str_field(tx, "from").to_lowercase(),
					to_address: str_field(tx, "to").to_lowercase(),
					value,
					symbol: self.main_symbol(tx),
					token: None,
					block_height: Some(height),
					block_hash: Some(str_field(tx, "blockHash").to_string())
						.filter(|hash| !hash.is_empty()),
					date: millis_to_datetime(str_field(tx, "transactionTime")),
					confirmations: None,
					tx_fee: parse_amount(str_field(tx, "txFee")).ok(),
					memo: None,
				})
			})
			.collect()
	}

	fn page_count(&self, raw: &Value) -> u32 {
		Self::first_entry(raw)
			.and_then(|entry| field_as_u64(entry, "totalPage"))
			.map(|pages| pages as u32)
			.unwrap_or(1)
			.max(1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::chain;
	use serde_json::json;
	use std::str::FromStr;

	fn parser() -> OkLinkParser {
		OkLinkParser::new(chain("avax").unwrap())
	}

	fn envelope(entry: Value) -> Value {
		json!({"code": "0", "msg": "", "data": [entry]})
	}

	#[test]
	fn test_parse_block_head() {
		let raw = envelope(json!({"chainFullName": "Avalanche-C", "lastHeight": "39394770"}));
		assert_eq!(parser().parse_block_head(&raw), Some(39394770));
	}

	#[test]
	fn test_parse_balance() {
		let raw = envelope(json!({"balance": "12.875", "balanceSymbol": "AVAX"}));
		let balance = parser()
			.parse_balance("0xB985cf3042a9cE3a2Dc48399F8E39d7119D39D6F", &raw)
			.unwrap();
		assert_eq!(balance.amount, Decimal::from_str("12.875").unwrap());
		assert_eq!(balance.symbol, "AVAX");
		assert_eq!(balance.address, "0xB985cf3042a9cE3a2Dc48399F8E39d7119D39D6F");
		assert!(balance.token.is_none());
	}

	#[test]
	fn test_parse_main_coin_tx_details() {
		let raw = envelope(json!({
			"txid": "0xcb02eca856eb0e4e5c0fc95c268b68edc361a442ea41095259fbb0ca477654cd",
			"height": "38301393",
			"transactionTime": "1701074236000",
			"amount": "1.432361",
			"transactionSymbol": "AVAX",
			"txfee": "0.000546",
			"confirm": "1093377",
			"state": "success",
			"methodId": "",
			"tokenContractAddress": "",
			"inputDetails": [{"inputHash": "0xb985cf3042a9ce3a2dc48399f8e39d7119d39d6f"}],
			"outputDetails": [{"outputHash": "0x2f13d388b85e0ecd32e7c3d7f36d1053354ef104"}]
		}));

		let transfers = parser().parse_tx_details(&raw, Some(39394770));
		assert_eq!(transfers.len(), 1);
		let transfer = &transfers[0];
		assert_eq!(transfer.kind, TransferKind::MainCoin);
		assert_eq!(transfer.value, Decimal::from_str("1.432361").unwrap());
		assert_eq!(
			transfer.from_address,
			"0xb985cf3042a9ce3a2dc48399f8e39d7119d39d6f"
		);
		assert_eq!(
			transfer.to_address,
			"0x2f13d388b85e0ecd32e7c3d7f36d1053354ef104"
		);
		assert_eq!(transfer.confirmations, Some(1093377));
		assert_eq!(transfer.tx_fee, Some(Decimal::from_str("0.000546").unwrap()));
		assert_eq!(transfer.block_height, Some(38301393));
		assert_eq!(transfer.date.unwrap().timestamp(), 1701074236);
	}

	#[test]
	fn test_negative_confirmations_are_propagated() {
		let raw = envelope(json!({
			"txid": "0x1",
			"height": "100",
			"amount": "1",
			"state": "success",
			"methodId": "",
			"inputDetails": [{"inputHash": "0xaaa0000000000000000000000000000000000001"}],
			"outputDetails": [{"outputHash": "0xbbb0000000000000000000000000000000000002"}]
		}));

		// Stale head snapshot behind the tx height
		let transfers = parser().parse_tx_details(&raw, Some(97));
		assert_eq!(transfers[0].confirmations, Some(-3));
	}

	#[test]
	fn test_token_tx_details() {
		let raw = envelope(json!({
			"txid": "0xd78bcd9e08b5b1f1ad7b3bfdf801c66a6e1acd9f4b4a5f8ba9c9e2a75ba65c11",
			"height": "38299000",
			"transactionTime": "1701070000000",
			"txfee": "0.001",
			"state": "success",
			"methodId": TOKEN_TRANSFER_METHOD,
			"tokenTransferDetails": [{
				"from": "0x06b7b1d53d0bb8e4860026fbb76c15b4a07e5b68",
				"to": "0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8",
				"amount": "499",
				"symbol": "USDt",
				"tokenContractAddress": "0x9702230A8Ea53601f5cD2dc00fDBc13d4dF4A8c7"
			}]
		}));

		let transfers = parser().parse_tx_details(&raw, None);
		assert_eq!(transfers.len(), 1);
		let transfer = &transfers[0];
		assert_eq!(transfer.kind, TransferKind::Token);
		assert_eq!(transfer.value, Decimal::from(499));
		assert_eq!(transfer.symbol, "USDt");
		assert_eq!(
			transfer.token.as_deref(),
			Some("0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7")
		);
	}

	#[test]
	fn test_ambiguous_token_details_yield_nothing() {
		let entry = json!({
			"from": "0x06b7b1d53d0bb8e4860026fbb76c15b4a07e5b68",
			"to": "0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8",
			"amount": "499",
			"symbol": "USDt"
		});
		let raw = envelope(json!({
			"txid": "0xd78b",
			"state": "success",
			"methodId": TOKEN_TRANSFER_METHOD,
			"tokenTransferDetails": [entry.clone(), entry]
		}));

		assert!(parser().parse_tx_details(&raw, None).is_empty());
	}

	#[test]
	fn test_parse_block_txs_keeps_failed_participants() {
		let raw = envelope(json!({
			"page": "1",
			"totalPage": "1",
			"transactionList": [
				{
					"txid": "0x1",
					"height": "38310997",
					"from": "0xAAA0000000000000000000000000000000000001",
					"to": "0xBBB0000000000000000000000000000000000002",
					"amount": "2.5",
					"state": "success",
					"methodId": ""
				},
				{
					"txid": "0x2",
					"height": "38310997",
					"from": "0xccc0000000000000000000000000000000000003",
					"to": "0xddd0000000000000000000000000000000000004",
					"amount": "1.0",
					"state": "fail",
					"methodId": ""
				},
				{"amount": "0.1"}
			]
		}));

		let transfers = parser().parse_block_txs(&raw);
		assert_eq!(transfers.len(), 2);
		assert!(transfers[0].success);
		assert_eq!(
			transfers[0].from_address,
			"0xaaa0000000000000000000000000000000000001"
		);
		assert!(!transfers[1].success);
		assert_eq!(transfers[1].tx_hash, "0x2");
	}

	#[test]
	fn test_page_count() {
		assert_eq!(
			parser().page_count(&envelope(json!({"totalPage": "3"}))),
			3
		);
		assert_eq!(parser().page_count(&envelope(json!({}))), 1);
	}

	#[test]
	fn test_parse_address_txs_skips_invalid_entries() {
		let raw = envelope(json!({
			"transactionLists": [
				{
					"txid": "0x1",
					"height": "100",
					"from": "0xaaa0000000000000000000000000000000000001",
					"to": "0xbbb0000000000000000000000000000000000002",
					"amount": "3",
					"state": "success",
					"methodId": "",
					"transactionTime": "1701074236000"
				},
				{
					"txid": "0x2",
					"height": "101",
					"from": "0xaaa0000000000000000000000000000000000001",
					"to": "0xaaa0000000000000000000000000000000000001",
					"amount": "1",
					"state": "success",
					"methodId": ""
				}
			]
		}));

		let transfers = parser().parse_address_txs("0xaaa", &raw, Some(105));
		assert_eq!(transfers.len(), 1);
		assert_eq!(transfers[0].tx_hash, "0x1");
		assert_eq!(transfers[0].confirmations, Some(5));
	}
}
