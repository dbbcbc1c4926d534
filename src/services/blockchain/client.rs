//! Raw provider client trait.
//!
//! A [`ProviderClient`] fetches unmodified JSON payloads from one data
//! provider. It knows URLs and authentication, nothing about payload shapes;
//! validation and parsing happen behind it. Every method has a default
//! implementation returning an unsupported-operation error, so a provider
//! only implements the operations it actually serves.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::ContractInfo;
use crate::services::blockchain::error::TransportError;

/// Raw JSON access to one data provider.
#[async_trait]
pub trait ProviderClient: Send + Sync {
	/// Main coin balance of one address
	async fn get_balance(&self, _address: &str) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_balance"))
	}

	/// Main coin balances of several addresses in one call
	async fn get_balances(&self, _addresses: &[String]) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_balances"))
	}

	/// Token balance of one address for one contract
	async fn get_token_balance(
		&self,
		_address: &str,
		_contract: &ContractInfo,
	) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_token_balance"))
	}

	/// Token balances of several addresses for one contract
	async fn get_token_balances(
		&self,
		_addresses: &[String],
		_contract: &ContractInfo,
	) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_token_balances"))
	}

	/// Full detail of one transaction
	async fn get_tx_details(&self, _tx_hash: &str) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_tx_details"))
	}

	/// Recent transactions of one address
	async fn get_address_txs(&self, _address: &str) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_address_txs"))
	}

	/// Recent token transactions of one address for one contract
	async fn get_token_txs(
		&self,
		_address: &str,
		_contract: &ContractInfo,
	) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_token_txs"))
	}

	/// One page of the transactions of one block; pages start at 1
	async fn get_block_txs(&self, _height: u64, _page: u32) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_block_txs"))
	}

	/// Current chain head
	async fn get_block_head(&self) -> Result<Value, TransportError> {
		Err(TransportError::unsupported_error("get_block_head"))
	}
}
