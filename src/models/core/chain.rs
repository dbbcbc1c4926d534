//! Static per-chain configuration.
//!
//! Everything a parser or the aggregation engine needs to know about a chain
//! lives here: the decimal exponent, the ledger model (account vs UTXO), the
//! currency identity of the main coin and the aggregation window settings.
//! Nothing is ever inferred from provider payloads at runtime.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::core::currency::CurrencyId;

/// Ledger model of a chain, driving address handling and parsing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
	/// Account-based chains (EVM style): hex addresses, explicit from/to
	Account,
	/// UTXO chains: vin/vout sets, amounts netted per address
	Utxo,
}

/// Configuration for a supported chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
	/// Lowercase ticker used as the chain identifier ("avax", "bch", ...)
	pub symbol: String,
	/// Human readable chain name
	pub name: String,
	/// Ledger model
	pub kind: ChainKind,
	/// Base-unit decimal exponent of the main coin
	pub decimals: u32,
	/// Currency identity of the main coin
	pub currency: CurrencyId,
	/// Block transactions below this amount are dropped from aggregation
	#[serde(default)]
	pub min_valid_tx_amount: Decimal,
	/// Upper bound on blocks walked in one aggregation run
	#[serde(default = "default_max_blocks_per_run")]
	pub max_blocks_per_run: u64,
	/// Subtracted from the reported head before windowing, for providers
	/// whose head runs ahead of indexed blocks
	#[serde(default)]
	pub block_height_offset: u64,
	/// How far behind the head a fresh cursor starts
	#[serde(default = "default_bootstrap_lag")]
	pub bootstrap_lag: u64,
}

fn default_max_blocks_per_run() -> u64 {
	100
}

fn default_bootstrap_lag() -> u64 {
	5
}

impl ChainConfig {
	/// Key under which the aggregation cursor for this chain is persisted.
	pub fn cursor_key(&self) -> String {
		format!("latest_block_height_processed_{}", self.symbol)
	}

	/// Canonical form of an address for comparisons and index keys.
	///
	/// Account chains compare case-insensitively, so addresses are
	/// lowercased. UTXO chains strip the human-readable prefix
	/// ("bitcoincash:...") and compare the remainder exactly.
	pub fn canonical_address(&self, address: &str) -> String {
		match self.kind {
			ChainKind::Account => address.to_lowercase(),
			ChainKind::Utxo => match address.split_once(':') {
				Some((_, body)) => body.to_string(),
				None => address.to_string(),
			},
		}
	}

	/// Checks whether an address is plausible for this chain.
	pub fn is_valid_address(&self, address: &str) -> bool {
		match self.kind {
			ChainKind::Account => ACCOUNT_ADDRESS.is_match(address),
			ChainKind::Utxo => UTXO_ADDRESS.is_match(address),
		}
	}
}

lazy_static! {
	static ref ACCOUNT_ADDRESS: Regex = Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap();
	static ref UTXO_ADDRESS: Regex =
		Regex::new(r"^[a-zA-Z0-9]+:?[a-km-zA-HJ-NP-Z0-9]{20,90}$").unwrap();

	/// Registry of supported chains, keyed by lowercase symbol.
	pub static ref CHAINS: HashMap<&'static str, ChainConfig> = {
		let mut chains = HashMap::new();
		chains.insert(
			"avax",
			ChainConfig {
				symbol: "avax".into(),
				name: "Avalanche C-Chain".into(),
				kind: ChainKind::Account,
				decimals: 18,
				currency: CurrencyId(57),
				min_valid_tx_amount: Decimal::ZERO,
				max_blocks_per_run: 100,
				block_height_offset: 0,
				bootstrap_lag: 5,
			},
		);
		chains.insert(
			"eth",
			ChainConfig {
				symbol: "eth".into(),
				name: "Ethereum".into(),
				kind: ChainKind::Account,
				decimals: 18,
				currency: CurrencyId(11),
				min_valid_tx_amount: Decimal::ZERO,
				max_blocks_per_run: 100,
				block_height_offset: 0,
				bootstrap_lag: 5,
			},
		);
		chains.insert(
			"btc",
			ChainConfig {
				symbol: "btc".into(),
				name: "Bitcoin".into(),
				kind: ChainKind::Utxo,
				decimals: 8,
				currency: CurrencyId(10),
				min_valid_tx_amount: Decimal::ZERO,
				max_blocks_per_run: 100,
				block_height_offset: 0,
				bootstrap_lag: 5,
			},
		);
		chains.insert(
			"ltc",
			ChainConfig {
				symbol: "ltc".into(),
				name: "Litecoin".into(),
				kind: ChainKind::Utxo,
				decimals: 8,
				currency: CurrencyId(12),
				min_valid_tx_amount: Decimal::ZERO,
				max_blocks_per_run: 100,
				block_height_offset: 0,
				bootstrap_lag: 5,
			},
		);
		chains.insert(
			"bch",
			ChainConfig {
				symbol: "bch".into(),
				name: "Bitcoin Cash".into(),
				kind: ChainKind::Utxo,
				decimals: 8,
				currency: CurrencyId(15),
				min_valid_tx_amount: Decimal::ZERO,
				max_blocks_per_run: 100,
				block_height_offset: 0,
				bootstrap_lag: 5,
			},
		);
		chains
	};
}

/// Looks up a chain by symbol, case-insensitively.
pub fn chain(symbol: &str) -> Option<&'static ChainConfig> {
	CHAINS.get(symbol.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_chain_lookup() {
		assert_eq!(chain("avax").unwrap().decimals, 18);
		assert_eq!(chain("AVAX").unwrap().currency, CurrencyId(57));
		assert_eq!(chain("bch").unwrap().kind, ChainKind::Utxo);
		assert!(chain("doge").is_none());
	}

	#[test]
	fn test_cursor_key() {
		assert_eq!(
			chain("avax").unwrap().cursor_key(),
			"latest_block_height_processed_avax"
		);
	}

	#[test]
	fn test_canonical_address_account() {
		let config = chain("avax").unwrap();
		assert_eq!(
			config.canonical_address("0xB985CF3042a9cE3a2Dc48399F8E39d7119D39D6F"),
			"0xb985cf3042a9ce3a2dc48399f8e39d7119d39d6f"
		);
	}

	#[test]
	fn test_canonical_address_utxo_strips_prefix() {
		let config = chain("bch").unwrap();
		assert_eq!(
			config.canonical_address("bitcoincash:qr5ef6g9yysr0v30jdl2s43y0mcpk59hqvx7r4xe8m"),
			"qr5ef6g9yysr0v30jdl2s43y0mcpk59hqvx7r4xe8m"
		);
		assert_eq!(
			config.canonical_address("qr5ef6g9yysr0v30jdl2s43y0mcpk59hqvx7r4xe8m"),
			"qr5ef6g9yysr0v30jdl2s43y0mcpk59hqvx7r4xe8m"
		);
	}

	#[test]
	fn test_address_validation() {
		let avax = chain("avax").unwrap();
		assert!(avax.is_valid_address("0xb985cf3042a9ce3a2dc48399f8e39d7119d39d6f"));
		assert!(!avax.is_valid_address("b985cf3042a9ce3a2dc48399f8e39d7119d39d6f"));
		assert!(!avax.is_valid_address("0xb985"));

		let bch = chain("bch").unwrap();
		assert!(bch.is_valid_address("1KocBCRHSs4sNQJycmzuYMpyQd5kXBJ1Sc"));
		assert!(bch.is_valid_address("bitcoincash:qr5ef6g9yysr0v30jdl2s43y0mcpk59hqvx7r4xe8m"));
	}
}
