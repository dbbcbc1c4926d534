//! Currency identities and token contract registry.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Stable numeric identity of a currency, shared across chains.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct CurrencyId(pub u32);

impl fmt::Display for CurrencyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A token contract deployed on some chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
	/// Contract address, stored lowercase
	pub address: String,
	/// Base-unit decimal exponent of the token
	pub decimals: u32,
	/// Display symbol
	pub symbol: String,
}

/// Token contracts of interest on one chain, keyed by currency.
pub type ContractMap = BTreeMap<CurrencyId, ContractInfo>;

lazy_static! {
	/// Symbol to currency mapping. Resolution is total: a symbol missing
	/// here rejects the record carrying it.
	static ref SYMBOL_TO_CURRENCY: HashMap<&'static str, CurrencyId> = {
		let mut map = HashMap::new();
		map.insert("btc", CurrencyId(10));
		map.insert("eth", CurrencyId(11));
		map.insert("ltc", CurrencyId(12));
		map.insert("usdt", CurrencyId(13));
		map.insert("bch", CurrencyId(15));
		map.insert("avax", CurrencyId(57));
		map
	};

	/// Token contracts tracked on Avalanche C-Chain.
	pub static ref AVAX_CONTRACTS: ContractMap = {
		let mut map = BTreeMap::new();
		map.insert(
			CurrencyId(13),
			ContractInfo {
				address: "0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7".into(),
				decimals: 6,
				symbol: "USDT".into(),
			},
		);
		map
	};
}

/// Resolves a provider-reported symbol to a currency, case-insensitively.
pub fn resolve_currency(symbol: &str) -> Option<CurrencyId> {
	SYMBOL_TO_CURRENCY
		.get(symbol.to_lowercase().as_str())
		.copied()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_resolution_is_case_insensitive() {
		assert_eq!(resolve_currency("AVAX"), Some(CurrencyId(57)));
		assert_eq!(resolve_currency("USDt"), Some(CurrencyId(13)));
		assert_eq!(resolve_currency("bch"), Some(CurrencyId(15)));
	}

	#[test]
	fn test_unmapped_symbol() {
		assert_eq!(resolve_currency("WAGMI"), None);
	}

	#[test]
	fn test_avax_contract_registry() {
		let usdt = AVAX_CONTRACTS.get(&CurrencyId(13)).unwrap();
		assert_eq!(usdt.decimals, 6);
		assert_eq!(usdt.address, "0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7");
	}
}
