//! Normalized entities produced by the parsers and returned by the facade.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::core::currency::CurrencyId;

/// Whether a transfer moves the chain's main coin or a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
	MainCoin,
	Token,
}

/// Direction of an address transaction relative to the queried address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	Incoming,
	Outgoing,
}

/// One normalized transfer as produced by a chain parser.
///
/// This is the internal lingua franca between parsers, the facade and the
/// aggregation engine. UTXO parsers emit one-sided records: an input-side
/// record has an empty `to_address`, an output-side record an empty
/// `from_address`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTx {
	pub kind: TransferKind,
	pub tx_hash: String,
	/// False for reverted or otherwise failed transactions. Failed
	/// transfers still name their participants but never carry money
	/// into an index.
	pub success: bool,
	pub from_address: String,
	pub to_address: String,
	/// Amount in human units, always non-negative here
	pub value: Decimal,
	/// Provider-reported symbol, resolved to a currency at conversion time
	pub symbol: String,
	/// Token contract address for token transfers
	pub token: Option<String>,
	pub block_height: Option<u64>,
	pub block_hash: Option<String>,
	pub date: Option<DateTime<Utc>>,
	/// head - height from one head snapshot; negative when the snapshot
	/// lags the transaction
	pub confirmations: Option<i64>,
	pub tx_fee: Option<Decimal>,
	pub memo: Option<String>,
}

/// A transfer inside a [`TransactionDetail`], with its currency resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
	pub kind: TransferKind,
	pub currency: CurrencyId,
	pub symbol: String,
	pub from_address: String,
	pub to_address: String,
	pub value: Decimal,
	pub is_valid: bool,
	pub token: Option<String>,
	pub memo: Option<String>,
}

/// One side of a UTXO transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
	pub address: String,
	pub value: Decimal,
}

/// Full detail of a single transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
	pub hash: String,
	pub success: bool,
	pub block: Option<u64>,
	pub date: Option<DateTime<Utc>>,
	pub fees: Option<Decimal>,
	pub memo: Option<String>,
	pub confirmations: Option<i64>,
	/// UTXO inputs; empty for account chains
	pub inputs: Vec<TxOutput>,
	/// UTXO outputs; empty for account chains
	pub outputs: Vec<TxOutput>,
	pub transfers: Vec<Transfer>,
}

impl TransactionDetail {
	/// Detail for a transaction that was rejected by validation or could
	/// not be parsed unambiguously. Ambiguity is an answer, not an error.
	pub fn failed(hash: impl Into<String>) -> Self {
		Self {
			hash: hash.into(),
			success: false,
			block: None,
			date: None,
			fees: None,
			memo: None,
			confirmations: None,
			inputs: Vec::new(),
			outputs: Vec::new(),
			transfers: Vec::new(),
		}
	}
}

/// A transaction as seen from one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressTx {
	/// The queried address, as given by the caller
	pub address: String,
	pub hash: String,
	pub direction: Direction,
	/// Signed amount: negative for outgoing, positive for incoming
	pub amount: Decimal,
	pub from_address: String,
	pub to_address: String,
	pub block: Option<u64>,
	pub date: Option<DateTime<Utc>>,
	pub confirmations: Option<i64>,
	pub contract_address: Option<String>,
	pub memo: Option<String>,
}

/// Confirmed balance of one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
	pub address: String,
	pub amount: Decimal,
	pub symbol: String,
	pub token: Option<String>,
	pub unconfirmed_amount: Option<Decimal>,
}

/// Reference to one monetary movement inside a block window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRef {
	pub tx_hash: String,
	pub value: Decimal,
	pub contract_address: Option<String>,
	pub block_height: u64,
	pub symbol: String,
}

/// Per-address, per-currency transaction references.
pub type AddressTxMap = BTreeMap<String, BTreeMap<CurrencyId, Vec<TxRef>>>;

/// Aggregated view of a block window.
///
/// Participant sets name every address touched, including parties of failed
/// transactions. The monetary maps only carry successful transfers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockTxIndex {
	pub input_addresses: BTreeSet<String>,
	pub output_addresses: BTreeSet<String>,
	pub outgoing_txs: AddressTxMap,
	pub incoming_txs: AddressTxMap,
}

impl BlockTxIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.input_addresses.is_empty()
			&& self.output_addresses.is_empty()
			&& self.outgoing_txs.is_empty()
			&& self.incoming_txs.is_empty()
	}

	/// Records a spend by `address`. Two transfers of the same transaction
	/// and contract merge by summing their values.
	pub fn record_outgoing(&mut self, address: &str, currency: CurrencyId, entry: TxRef) {
		Self::record(&mut self.outgoing_txs, address, currency, entry);
	}

	/// Records a receipt by `address`, with the same duplicate merge rule.
	pub fn record_incoming(&mut self, address: &str, currency: CurrencyId, entry: TxRef) {
		Self::record(&mut self.incoming_txs, address, currency, entry);
	}

	fn record(map: &mut AddressTxMap, address: &str, currency: CurrencyId, entry: TxRef) {
		let refs = map
			.entry(address.to_string())
			.or_default()
			.entry(currency)
			.or_default();
		if let Some(existing) = refs
			.iter_mut()
			.find(|r| r.tx_hash == entry.tx_hash && r.contract_address == entry.contract_address)
		{
			existing.value += entry.value;
		} else {
			refs.push(entry);
		}
	}

	/// Folds another index into this one, preserving list order and the
	/// duplicate merge rule.
	pub fn merge(&mut self, other: BlockTxIndex) {
		self.input_addresses.extend(other.input_addresses);
		self.output_addresses.extend(other.output_addresses);
		for (address, by_currency) in other.outgoing_txs {
			for (currency, refs) in by_currency {
				for entry in refs {
					self.record_outgoing(&address, currency, entry);
				}
			}
		}
		for (address, by_currency) in other.incoming_txs {
			for (currency, refs) in by_currency {
				for entry in refs {
					self.record_incoming(&address, currency, entry);
				}
			}
		}
	}
}
