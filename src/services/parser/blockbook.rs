//! Blockbook parser for UTXO chains.
//!
//! Blockbook reports integer base units, so every amount goes through
//! base-unit scaling with the chain's exponent. UTXO transactions have no
//! single from/to pair; amounts are netted per address across vin and vout,
//! and each address with a non-zero net becomes a one-sided transfer record
//! (empty `to_address` for spenders, empty `from_address` for receivers).
//! The fee is deducted from the spending side, largest spender first.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{from_base_units, Balance, ChainConfig, TransferKind, TransferTx, TxOutput};
use crate::services::parser::{field_as_u64, secs_to_datetime, ChainParser};
use crate::services::validator::blockbook::BlockbookValidator;
use crate::services::validator::{str_field, ResponseValidator};

/// Parser for Blockbook payloads.
pub struct BlockbookParser {
	config: &'static ChainConfig,
	validator: BlockbookValidator,
}

impl BlockbookParser {
	pub fn new(config: &'static ChainConfig) -> Self {
		Self {
			config,
			validator: BlockbookValidator::new(config),
		}
	}

	fn amount(&self, raw: &str) -> Option<Decimal> {
		from_base_units(raw, self.config.decimals).ok()
	}

	fn side_address(&self, side: &Value) -> Option<String> {
		if side.get("isAddress").and_then(Value::as_bool) == Some(false) {
			return None;
		}
		let address = side.pointer("/addresses/0").and_then(Value::as_str)?;
		Some(self.config.canonical_address(address))
	}

	/// Net amount per address across vin and vout. Spenders come out
	/// negative; their negative sum includes the fee.
	fn net_amounts(&self, tx: &Value) -> BTreeMap<String, Decimal> {
		let mut nets: BTreeMap<String, Decimal> = BTreeMap::new();
		for side in tx.get("vin").and_then(Value::as_array).into_iter().flatten() {
			if let (Some(address), Some(value)) = (
				self.side_address(side),
				self.amount(str_field(side, "value")),
			) {
				*nets.entry(address).or_insert(Decimal::ZERO) -= value;
			}
		}
		for side in tx.get("vout").and_then(Value::as_array).into_iter().flatten() {
			if let (Some(address), Some(value)) = (
				self.side_address(side),
				self.amount(str_field(side, "value")),
			) {
				*nets.entry(address).or_insert(Decimal::ZERO) += value;
			}
		}
		nets
	}

	/// Fee deduction per spender, largest net spend first. A spender whose
	/// whole net is eaten by the fee keeps a zero-value record; any
	/// remainder rolls over to the next spender.
	fn fee_shares(nets: &BTreeMap<String, Decimal>, fee: Decimal) -> BTreeMap<String, Decimal> {
		let mut spenders: Vec<(&String, Decimal)> = nets
			.iter()
			.filter(|(_, net)| net.is_sign_negative())
			.map(|(address, net)| (address, -*net))
			.collect();
		spenders.sort_by(|a, b| b.1.cmp(&a.1));

		let mut shares = BTreeMap::new();
		let mut remaining = fee;
		for (address, spent) in spenders {
			if remaining.is_zero() {
				break;
			}
			let share = spent.min(remaining);
			remaining -= share;
			shares.insert(address.clone(), share);
		}
		shares
	}

	/// One-sided transfer records for one transaction, fee deducted from
	/// the spending side.
	fn tx_to_transfers(&self, tx: &Value, block_head: Option<u64>) -> Vec<TransferTx> {
		let tx_hash = str_field(tx, "txid").to_string();
		let block_height = field_as_u64(tx, "blockHeight").filter(|height| *height > 0);
		let date = tx
			.get("blockTime")
			.and_then(Value::as_i64)
			.and_then(secs_to_datetime);
		let confirmations = match (block_head, block_height) {
			(Some(head), Some(height)) => Some(head as i64 - height as i64),
			_ => tx.get("confirmations").and_then(Value::as_i64),
		};
		let fee = self.amount(str_field(tx, "fees"));

		let nets = self.net_amounts(tx);
		let fee_shares = Self::fee_shares(&nets, fee.unwrap_or(Decimal::ZERO));

		let mut transfers = Vec::new();
		for (address, net) in &nets {
			if net.is_zero() {
				continue;
			}
			let (from_address, to_address, mut value) = if net.is_sign_negative() {
				(address.clone(), String::new(), -*net)
			} else {
				(String::new(), address.clone(), *net)
			};
			if let Some(share) = fee_shares.get(address) {
				value -= *share;
			}
			transfers.push(TransferTx {
				kind: TransferKind::MainCoin,
				tx_hash: tx_hash.clone(),
				success: true,
				from_address,
				to_address,
				value,
				symbol: self.config.symbol.to_uppercase(),
				token: None,
				block_height,
				block_hash: Some(str_field(tx, "blockHash").to_string())
					.filter(|hash| !hash.is_empty()),
				date,
				confirmations,
				tx_fee: fee,
				memo: None,
			});
		}
		transfers
	}
}

impl ChainParser for BlockbookParser {
	fn config(&self) -> &'static ChainConfig {
		self.config
	}

	fn validator(&self) -> &dyn ResponseValidator {
		&self.validator
	}

	fn parse_block_head(&self, raw: &Value) -> Option<u64> {
		raw.pointer("/blockbook/bestHeight").and_then(Value::as_u64)
	}

	fn parse_balance(&self, address: &str, raw: &Value) -> Option<Balance> {
		let amount = self.amount(str_field(raw, "balance"))?;
		let unconfirmed_amount = self.amount(str_field(raw, "unconfirmedBalance"));
		Some(Balance {
			address: address.to_string(),
			amount,
			symbol: self.config.symbol.to_uppercase(),
			token: None,
			unconfirmed_amount,
		})
	}

	fn parse_tx_details(&self, raw: &Value, block_head: Option<u64>) -> Vec<TransferTx> {
		if !self.validator.transaction_ok(raw) {
			debug!("transaction detail payload rejected");
			return Vec::new();
		}
		self.tx_to_transfers(raw, block_head)
	}

	fn parse_tx_io(&self, raw: &Value) -> (Vec<TxOutput>, Vec<TxOutput>) {
		let collect = |key: &str| -> Vec<TxOutput> {
			raw.get(key)
				.and_then(Value::as_array)
				.into_iter()
				.flatten()
				.filter_map(|side| {
					Some(TxOutput {
						address: self.side_address(side)?,
						value: self.amount(str_field(side, "value"))?,
					})
				})
				.collect()
		};
		(collect("vin"), collect("vout"))
	}

	fn parse_address_txs(
		&self,
		address: &str,
		raw: &Value,
		block_head: Option<u64>,
	) -> Vec<TransferTx> {
		let me = self.config.canonical_address(address);
		let transactions = match raw.get("transactions").and_then(Value::as_array) {
			Some(transactions) => transactions,
			None => return Vec::new(),
		};

		transactions
			.iter()
			.filter(|tx| self.validator.transaction_ok(tx))
			.filter_map(|tx| {
				// Collapse the one-sided records of this tx into a single
				// record seen from the queried address.
				let transfers = self.tx_to_transfers(tx, block_head);
				let mine = transfers.iter().find(|t| {
					t.from_address == me || t.to_address == me
				})?;
				let counterparty = if mine.from_address == me {
					transfers
						.iter()
						.find(|t| !t.to_address.is_empty() && t.to_address != me)
						.map(|t| t.to_address.clone())
						.unwrap_or_default()
				} else {
					transfers
						.iter()
						.find(|t| !t.from_address.is_empty() && t.from_address != me)
						.map(|t| t.from_address.clone())
						.unwrap_or_default()
				};
				let mut record = mine.clone();
				if record.from_address == me {
					record.to_address = counterparty;
				} else {
					record.from_address = counterparty;
				}
				Some(record)
			})
			.collect()
	}

	fn parse_block_txs(&self, raw: &Value) -> Vec<TransferTx> {
		let height = field_as_u64(raw, "height");
		raw.get("txs")
			.and_then(Value::as_array)
			.into_iter()
			.flatten()
			.filter(|tx| self.validator.transaction_ok(tx))
			.flat_map(|tx| {
				let mut transfers = self.tx_to_transfers(tx, None);
				for transfer in &mut transfers {
					if transfer.block_height.is_none() {
						transfer.block_height = height;
					}
				}
				transfers
			})
			.collect()
	}

	fn page_count(&self, raw: &Value) -> u32 {
		field_as_u64(raw, "totalPages")
			.map(|pages| pages as u32)
			.unwrap_or(1)
			.max(1)
	}
}
