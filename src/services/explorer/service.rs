//! The explorer facade.
//!
//! [`ExplorerInterface`] is the single entry point callers use. Every
//! operation follows the same shape: resolve the active provider for the
//! operation, fetch the raw payload, validate it, parse it, convert the
//! normalized records into public entities. Chain and provider specifics
//! never leak past this module.
//!
//! Failure semantics differ by operation shape. Single-entity lookups fail
//! the whole call on a rejected payload; listing operations log and return
//! an empty result; transaction details degrade to a `success == false`
//! detail because "this transaction is not a valid transfer" is an answer,
//! not an error.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::models::{
	resolve_currency, AddressTx, Balance, ChainConfig, ContractMap, Direction, TransactionDetail,
	Transfer, TransferTx, TxOutput,
};
use crate::services::aggregator::{
	fetch_block_transfers, BlockAggregation, BlockAggregator, CursorStore,
};
use crate::services::blockchain::{Operation, ProviderApi, ProviderRegistry, TransportError};
use crate::services::explorer::error::ExplorerError;

/// Uniform access to one chain across its registered providers.
pub struct ExplorerInterface {
	config: &'static ChainConfig,
	registry: ProviderRegistry,
	cursor_store: Arc<dyn CursorStore>,
}

impl ExplorerInterface {
	pub fn new(
		config: &'static ChainConfig,
		registry: ProviderRegistry,
		cursor_store: Arc<dyn CursorStore>,
	) -> Self {
		Self {
			config,
			registry,
			cursor_store,
		}
	}

	pub fn config(&self) -> &'static ChainConfig {
		self.config
	}

	/// Administrative access to provider selection.
	pub fn registry_mut(&mut self) -> &mut ProviderRegistry {
		&mut self.registry
	}

	fn validation_metadata(&self, api: &ProviderApi) -> HashMap<String, String> {
		HashMap::from([
			("chain".to_string(), self.config.symbol.clone()),
			("provider".to_string(), api.name.clone()),
		])
	}

	/// One head snapshot for confirmation math, taken only when the
	/// provider needs it.
	async fn head_snapshot(&self, api: &ProviderApi) -> Result<Option<u64>, ExplorerError> {
		if !api.needs_block_head {
			return Ok(None);
		}
		Ok(Some(self.get_block_head().await?))
	}

	/// Current head height of the chain.
	#[instrument(skip(self))]
	pub async fn get_block_head(&self) -> Result<u64, ExplorerError> {
		let api = self.registry.get_api(Operation::BlockHead)?;
		let raw = api.client.get_block_head().await?;
		if !api.parser.validator().validate_block_head(&raw) {
			return Err(ExplorerError::validation_error(
				"block head response rejected",
				None,
				Some(self.validation_metadata(&api)),
			));
		}
		api.parser.parse_block_head(&raw).ok_or_else(|| {
			ExplorerError::parse_error(
				"block head response carried no height",
				None,
				Some(self.validation_metadata(&api)),
			)
		})
	}

	/// Main coin balance of one address.
	#[instrument(skip(self))]
	pub async fn get_balance(&self, address: &str) -> Result<Balance, ExplorerError> {
		let api = self.registry.get_api(Operation::Balance)?;
		let raw = api.client.get_balance(address).await?;
		if !api.parser.validator().validate_balance(&raw) {
			return Err(ExplorerError::validation_error(
				"balance response rejected",
				None,
				Some(self.validation_metadata(&api)),
			));
		}
		api.parser.parse_balance(address, &raw).ok_or_else(|| {
			ExplorerError::parse_error(
				"balance response could not be normalized",
				None,
				Some(self.validation_metadata(&api)),
			)
		})
	}

	/// Main coin balances of several addresses. Falls back to one call per
	/// address only when the provider has no multi-address endpoint; inside
	/// the fallback, rejected or unparsable responses are skipped while
	/// transport failures propagate.
	#[instrument(skip(self, addresses), fields(count = addresses.len()))]
	pub async fn get_balances(&self, addresses: &[String]) -> Result<Vec<Balance>, ExplorerError> {
		if let Ok(api) = self.registry.get_api(Operation::Balances) {
			match api.client.get_balances(addresses).await {
				Ok(raw) => {
					if api.parser.validator().validate_balances(&raw) {
						return Ok(api.parser.parse_balances(&raw));
					}
					warn!(provider = %api.name, "balances response rejected");
					return Ok(Vec::new());
				}
				Err(TransportError::UnsupportedError(_)) => {
					debug!(provider = %api.name, "no multi-address endpoint, querying one by one");
				}
				Err(e) => return Err(e.into()),
			}
		}

		let mut balances = Vec::new();
		for address in addresses {
			match self.get_balance(address).await {
				Ok(balance) => balances.push(balance),
				Err(ExplorerError::TransportError(e)) => return Err(e.into()),
				Err(e) => warn!(address = %address, error = %e, "balance lookup skipped"),
			}
		}
		Ok(balances)
	}

	/// Token balance of one address, for the first registered contract.
	#[instrument(skip(self, contracts))]
	pub async fn get_token_balance(
		&self,
		address: &str,
		contracts: &ContractMap,
	) -> Result<Balance, ExplorerError> {
		let contract = contracts.values().next().ok_or_else(|| {
			ExplorerError::validation_error(
				"no token contract registered for chain",
				None,
				Some(HashMap::from([(
					"chain".to_string(),
					self.config.symbol.clone(),
				)])),
			)
		})?;
		let api = self.registry.get_api(Operation::TokenBalance)?;
		let raw = api.client.get_token_balance(address, contract).await?;
		if !api.parser.validator().validate_token_balance(&raw) {
			return Err(ExplorerError::validation_error(
				"token balance response rejected",
				None,
				Some(self.validation_metadata(&api)),
			));
		}
		api.parser
			.parse_token_balance(address, contract, &raw)
			.ok_or_else(|| {
				ExplorerError::parse_error(
					"token balance response could not be normalized",
					None,
					Some(self.validation_metadata(&api)),
				)
			})
	}

	/// Token balances of several addresses for the first registered
	/// contract.
	#[instrument(skip(self, addresses, contracts), fields(count = addresses.len()))]
	pub async fn get_token_balances(
		&self,
		addresses: &[String],
		contracts: &ContractMap,
	) -> Result<Vec<Balance>, ExplorerError> {
		let contract = match contracts.values().next() {
			Some(contract) => contract,
			None => return Ok(Vec::new()),
		};
		let api = self.registry.get_api(Operation::TokenBalances)?;
		let raw = api.client.get_token_balances(addresses, contract).await?;
		if !api.parser.validator().validate_token_balances(&raw) {
			warn!(provider = %api.name, "token balances response rejected");
			return Ok(Vec::new());
		}
		Ok(api.parser.parse_token_balances(contracts, &raw))
	}

	/// Full detail of one transaction.
	///
	/// A rejected or ambiguous payload yields a failed detail, never an
	/// error: the transaction exists, it just is not a usable transfer.
	#[instrument(skip(self))]
	pub async fn get_tx_details(&self, tx_hash: &str) -> Result<TransactionDetail, ExplorerError> {
		let api = self.registry.get_api(Operation::TxDetails)?;
		let block_head = self.head_snapshot(&api).await?;
		let raw = api.client.get_tx_details(tx_hash).await?;

		let transfers = api.parser.parse_tx_details(&raw, block_head);
		if transfers.is_empty() {
			return Ok(TransactionDetail::failed(tx_hash));
		}
		let (inputs, outputs) = api.parser.parse_tx_io(&raw);
		Ok(self.to_transaction_detail(tx_hash, transfers, inputs, outputs))
	}

	/// Recent transactions of one address, optionally filtered by
	/// direction.
	#[instrument(skip(self))]
	pub async fn get_address_txs(
		&self,
		address: &str,
		direction: Option<Direction>,
	) -> Result<Vec<AddressTx>, ExplorerError> {
		let api = self.registry.get_api(Operation::AddressTxs)?;
		let block_head = self.head_snapshot(&api).await?;
		let raw = api.client.get_address_txs(address).await?;
		if !api.parser.validator().validate_address_txs(&raw) {
			warn!(provider = %api.name, "address transactions response rejected");
			return Ok(Vec::new());
		}
		let transfers = api.parser.parse_address_txs(address, &raw, block_head);
		Ok(self.to_address_txs(address, transfers, direction))
	}

	/// Recent token transactions of one address for the first registered
	/// contract.
	#[instrument(skip(self, contracts))]
	pub async fn get_token_txs(
		&self,
		address: &str,
		contracts: &ContractMap,
		direction: Option<Direction>,
	) -> Result<Vec<AddressTx>, ExplorerError> {
		let contract = match contracts.values().next() {
			Some(contract) => contract,
			None => return Ok(Vec::new()),
		};
		let api = self.registry.get_api(Operation::TokenTxs)?;
		let block_head = self.head_snapshot(&api).await?;
		let raw = api.client.get_token_txs(address, contract).await?;
		if !api.parser.validator().validate_token_txs(&raw) {
			warn!(provider = %api.name, "token transactions response rejected");
			return Ok(Vec::new());
		}
		let transfers = api
			.parser
			.parse_token_txs(address, contract, &raw, block_head);
		Ok(self.to_address_txs(address, transfers, direction))
	}

	/// Normalized transfers of one block, all pages.
	#[instrument(skip(self))]
	pub async fn get_block_txs(&self, height: u64) -> Result<Vec<TransferTx>, ExplorerError> {
		let api = self.registry.get_api(Operation::BlockTxs)?;
		Ok(fetch_block_transfers(&api, height).await?)
	}

	/// Runs one incremental aggregation pass over the unprocessed block
	/// window and advances the cursor.
	#[instrument(skip(self))]
	pub async fn get_latest_block(
		&self,
		include_inputs: bool,
		include_info: bool,
	) -> Result<BlockAggregation, ExplorerError> {
		let api = self.registry.get_api(Operation::BlockTxs)?;
		let head = self.get_block_head().await?;
		let aggregator = BlockAggregator::new(self.config, self.cursor_store.clone());
		Ok(aggregator
			.run(&api, head, include_inputs, include_info)
			.await?)
	}

	fn to_transaction_detail(
		&self,
		tx_hash: &str,
		transfers: Vec<TransferTx>,
		inputs: Vec<TxOutput>,
		outputs: Vec<TxOutput>,
	) -> TransactionDetail {
		let header = &transfers[0];
		let block = header.block_height;
		let date = header.date;
		let fees = header.tx_fee;
		let memo = header.memo.clone();
		let confirmations = header.confirmations;
		let success = transfers.iter().all(|t| t.success);

		let converted: Vec<Transfer> = transfers
			.into_iter()
			.filter_map(|t| {
				let from = self.config.canonical_address(&t.from_address);
				let to = self.config.canonical_address(&t.to_address);
				if !from.is_empty() && from == to {
					return None;
				}
				let currency = match resolve_currency(&t.symbol) {
					Some(currency) => currency,
					None => {
						warn!(symbol = %t.symbol, tx = %t.tx_hash, "unmapped symbol, record dropped");
						return None;
					}
				};
				Some(Transfer {
					kind: t.kind,
					currency,
					symbol: t.symbol,
					from_address: from,
					to_address: to,
					value: t.value,
					is_valid: t.success,
					token: t.token,
					memo: t.memo,
				})
			})
			.collect();

		if converted.is_empty() {
			return TransactionDetail::failed(tx_hash);
		}

		TransactionDetail {
			hash: tx_hash.to_string(),
			success,
			block,
			date,
			fees,
			memo,
			confirmations,
			inputs,
			outputs,
			transfers: converted,
		}
	}

	fn to_address_txs(
		&self,
		address: &str,
		transfers: Vec<TransferTx>,
		filter: Option<Direction>,
	) -> Vec<AddressTx> {
		let me = self.config.canonical_address(address);
		transfers
			.into_iter()
			.filter_map(|t| {
				let from = self.config.canonical_address(&t.from_address);
				let to = self.config.canonical_address(&t.to_address);
				let direction = if from == me {
					Direction::Outgoing
				} else if to == me {
					Direction::Incoming
				} else {
					return None;
				};
				if let Some(wanted) = filter {
					if wanted != direction {
						return None;
					}
				}
				let amount = match direction {
					Direction::Outgoing => -t.value,
					Direction::Incoming => t.value,
				};
				Some(AddressTx {
					address: address.to_string(),
					hash: t.tx_hash,
					direction,
					amount,
					from_address: from,
					to_address: to,
					block: t.block_height,
					date: t.date,
					confirmations: t.confirmations,
					contract_address: t.token,
					memo: t.memo,
				})
			})
			.collect()
	}
}
