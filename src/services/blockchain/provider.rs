//! Provider registry and selection.
//!
//! Every logical operation has an ordered list of candidate providers; the
//! head of the list is the active one. Selection is deterministic: the same
//! registry state always yields the same provider. There is no automatic
//! failover; a transport failure surfaces to the caller, and promotion of a
//! backup provider is an explicit administrative action.

use std::{collections::HashMap, fmt, sync::Arc};
use tracing::info;

use crate::services::blockchain::client::ProviderClient;
use crate::services::explorer::error::ExplorerError;
use crate::services::parser::ChainParser;

/// Logical operations a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	Balance,
	Balances,
	TokenBalance,
	TokenBalances,
	TxDetails,
	AddressTxs,
	TokenTxs,
	BlockTxs,
	BlockHead,
}

impl Operation {
	/// All operations, for registering a provider that serves everything.
	pub const ALL: [Operation; 9] = [
		Operation::Balance,
		Operation::Balances,
		Operation::TokenBalance,
		Operation::TokenBalances,
		Operation::TxDetails,
		Operation::AddressTxs,
		Operation::TokenTxs,
		Operation::BlockTxs,
		Operation::BlockHead,
	];
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Operation::Balance => "balance",
			Operation::Balances => "balances",
			Operation::TokenBalance => "token_balance",
			Operation::TokenBalances => "token_balances",
			Operation::TxDetails => "tx_details",
			Operation::AddressTxs => "address_txs",
			Operation::TokenTxs => "token_txs",
			Operation::BlockTxs => "block_txs",
			Operation::BlockHead => "block_head",
		};
		write!(f, "{}", name)
	}
}

/// One registered provider: a raw client plus the parser that understands
/// its payloads.
pub struct ProviderApi {
	/// Unique provider name within a registry ("oklink", "blockbook", ...)
	pub name: String,
	pub client: Arc<dyn ProviderClient>,
	pub parser: Arc<dyn ChainParser>,
	/// Whether operations against this provider need a fresh head snapshot
	/// to compute confirmations
	pub needs_block_head: bool,
	/// Whether block transaction listings are paged
	pub supports_paging: bool,
}

/// Ordered provider lists per operation.
#[derive(Default)]
pub struct ProviderRegistry {
	apis: HashMap<Operation, Vec<Arc<ProviderApi>>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a provider to the candidate list of one operation.
	pub fn register(&mut self, operation: Operation, api: Arc<ProviderApi>) {
		self.apis.entry(operation).or_default().push(api);
	}

	/// Appends a provider to the candidate lists of all operations.
	pub fn register_all(&mut self, api: Arc<ProviderApi>) {
		for operation in Operation::ALL {
			self.register(operation, api.clone());
		}
	}

	/// Returns the active provider for an operation.
	pub fn get_api(&self, operation: Operation) -> Result<Arc<ProviderApi>, ExplorerError> {
		self.apis
			.get(&operation)
			.and_then(|list| list.first())
			.cloned()
			.ok_or_else(|| {
				ExplorerError::provider_error(
					"no provider registered for operation",
					None,
					Some(HashMap::from([(
						"operation".to_string(),
						operation.to_string(),
					)])),
				)
			})
	}

	/// Names of the candidate providers for an operation, in order.
	pub fn providers(&self, operation: Operation) -> Vec<String> {
		self.apis
			.get(&operation)
			.map(|list| list.iter().map(|api| api.name.clone()).collect())
			.unwrap_or_default()
	}

	/// Promotes a named provider to the head of one operation's list.
	///
	/// This is the only way the active provider ever changes.
	pub fn set_primary(&mut self, operation: Operation, name: &str) -> Result<(), ExplorerError> {
		let list = self.apis.get_mut(&operation).ok_or_else(|| {
			ExplorerError::provider_error(
				"no provider registered for operation",
				None,
				Some(HashMap::from([(
					"operation".to_string(),
					operation.to_string(),
				)])),
			)
		})?;

		let position = list.iter().position(|api| api.name == name).ok_or_else(|| {
			ExplorerError::provider_error(
				"provider is not registered for operation",
				None,
				Some(HashMap::from([
					("operation".to_string(), operation.to_string()),
					("provider".to_string(), name.to_string()),
				])),
			)
		})?;

		let api = list.remove(position);
		list.insert(0, api);
		info!(operation = %operation, provider = name, "primary provider changed");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::chain;
	use crate::services::parser::oklink::OkLinkParser;

	struct NullClient;
	impl ProviderClient for NullClient {}

	fn api(name: &str) -> Arc<ProviderApi> {
		Arc::new(ProviderApi {
			name: name.to_string(),
			client: Arc::new(NullClient),
			parser: Arc::new(OkLinkParser::new(chain("avax").unwrap())),
			needs_block_head: true,
			supports_paging: true,
		})
	}

	#[test]
	fn test_first_registered_is_active() {
		let mut registry = ProviderRegistry::new();
		registry.register(Operation::Balance, api("oklink"));
		registry.register(Operation::Balance, api("backup"));

		assert_eq!(registry.get_api(Operation::Balance).unwrap().name, "oklink");
		assert_eq!(
			registry.providers(Operation::Balance),
			vec!["oklink".to_string(), "backup".to_string()]
		);
	}

	#[test]
	fn test_missing_operation_is_an_error() {
		let registry = ProviderRegistry::new();
		assert!(matches!(
			registry.get_api(Operation::TxDetails),
			Err(ExplorerError::ProviderError(_))
		));
	}

	#[test]
	fn test_set_primary_promotes() {
		let mut registry = ProviderRegistry::new();
		registry.register(Operation::Balance, api("oklink"));
		registry.register(Operation::Balance, api("backup"));

		registry.set_primary(Operation::Balance, "backup").unwrap();
		assert_eq!(registry.get_api(Operation::Balance).unwrap().name, "backup");
		assert_eq!(
			registry.providers(Operation::Balance),
			vec!["backup".to_string(), "oklink".to_string()]
		);
	}

	#[test]
	fn test_set_primary_unknown_provider() {
		let mut registry = ProviderRegistry::new();
		registry.register(Operation::Balance, api("oklink"));
		assert!(registry.set_primary(Operation::Balance, "nope").is_err());
	}

	#[test]
	fn test_register_all_covers_every_operation() {
		let mut registry = ProviderRegistry::new();
		registry.register_all(api("oklink"));
		for operation in Operation::ALL {
			assert_eq!(registry.get_api(operation).unwrap().name, "oklink");
		}
	}
}
