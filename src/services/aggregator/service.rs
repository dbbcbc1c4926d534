//! Incremental block-window aggregation.
//!
//! One run walks the half-open window (cursor, head], clamped to the
//! per-chain block budget, fetches every block's transactions (all pages)
//! concurrently, accumulates a [`BlockTxIndex`] in ascending height order
//! and finally advances the cursor with a compare-and-swap. Any failure
//! inside the window aborts the whole run with the cursor untouched, so a
//! retry re-walks the identical range and produces the identical index.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::models::{resolve_currency, BlockTxIndex, ChainConfig, TransferTx, TxRef};
use crate::services::aggregator::error::AggregatorError;
use crate::services::aggregator::storage::CursorStore;
use crate::services::blockchain::ProviderApi;

/// Number of blocks fetched in parallel inside one window.
const MAX_CONCURRENT_BLOCKS: usize = 8;

/// Result of one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockAggregation {
	pub index: BlockTxIndex,
	/// Highest block height covered by the cursor after this run
	pub latest_block_processed: u64,
}

/// Walks block windows and maintains the per-chain cursor.
pub struct BlockAggregator {
	config: &'static ChainConfig,
	store: Arc<dyn CursorStore>,
}

impl BlockAggregator {
	pub fn new(config: &'static ChainConfig, store: Arc<dyn CursorStore>) -> Self {
		Self { config, store }
	}

	/// Runs one aggregation pass against `reported_head`.
	///
	/// `include_inputs` controls whether spender addresses are collected;
	/// `include_info` controls whether the monetary maps are built.
	#[instrument(skip(self, api), fields(chain = %self.config.symbol))]
	pub async fn run(
		&self,
		api: &Arc<ProviderApi>,
		reported_head: u64,
		include_inputs: bool,
		include_info: bool,
	) -> Result<BlockAggregation, AggregatorError> {
		let head = reported_head.saturating_sub(self.config.block_height_offset);
		let key = self.config.cursor_key();

		let cursor = self.store.get(&key).await.map_err(|e| {
			AggregatorError::storage_error(
				"failed to read cursor",
				Some(e.into()),
				Some(HashMap::from([("key".to_string(), key.clone())])),
			)
		})?;
		let processed = cursor.unwrap_or_else(|| head.saturating_sub(self.config.bootstrap_lag));

		if head <= processed {
			debug!(head, processed, "no new blocks");
			return Ok(BlockAggregation {
				index: BlockTxIndex::new(),
				latest_block_processed: processed,
			});
		}

		let first = processed + 1;
		let last = head.min(processed + self.config.max_blocks_per_run);
		debug!(first, last, head, "walking block window");

		let mut blocks: Vec<(u64, Vec<TransferTx>)> = stream::iter((first..=last).map(|height| {
			let api = api.clone();
			async move {
				let transfers = fetch_block_transfers(&api, height).await?;
				Ok::<_, AggregatorError>((height, transfers))
			}
		}))
		.buffer_unordered(MAX_CONCURRENT_BLOCKS)
		.try_collect()
		.await?;

		// Fetches complete out of order; accumulation must not
		blocks.sort_by_key(|(height, _)| *height);

		let mut index = BlockTxIndex::new();
		for (height, transfers) in &blocks {
			self.accumulate(&mut index, *height, transfers, include_inputs, include_info);
		}

		let swapped = self
			.store
			.compare_and_swap(&key, cursor, last)
			.await
			.map_err(|e| {
				AggregatorError::storage_error(
					"failed to persist cursor",
					Some(e.into()),
					Some(HashMap::from([("key".to_string(), key.clone())])),
				)
			})?;
		if !swapped {
			return Err(AggregatorError::cursor_conflict_error(
				"cursor changed underneath the run",
				None,
				Some(HashMap::from([
					("key".to_string(), key),
					(
						"expected".to_string(),
						cursor.map(|c| c.to_string()).unwrap_or_else(|| "none".into()),
					),
					("new".to_string(), last.to_string()),
				])),
			));
		}

		Ok(BlockAggregation {
			index,
			latest_block_processed: last,
		})
	}

	fn accumulate(
		&self,
		index: &mut BlockTxIndex,
		height: u64,
		transfers: &[TransferTx],
		include_inputs: bool,
		include_info: bool,
	) {
		for transfer in transfers {
			let from = self.config.canonical_address(&transfer.from_address);
			let to = self.config.canonical_address(&transfer.to_address);
			let self_transfer = !from.is_empty() && from == to;

			// Participants are collected even for failed transactions
			if include_inputs && !from.is_empty() {
				index.input_addresses.insert(from.clone());
			}
			if !to.is_empty() {
				index.output_addresses.insert(to.clone());
			}

			if !include_info || !transfer.success || self_transfer {
				continue;
			}
			if transfer.value.is_zero() || transfer.value < self.config.min_valid_tx_amount {
				continue;
			}
			let currency = match resolve_currency(&transfer.symbol) {
				Some(currency) => currency,
				None => {
					warn!(symbol = %transfer.symbol, tx = %transfer.tx_hash, "unmapped symbol, record dropped");
					continue;
				}
			};

			let entry = TxRef {
				tx_hash: transfer.tx_hash.clone(),
				value: transfer.value,
				contract_address: transfer.token.clone(),
				block_height: transfer.block_height.unwrap_or(height),
				symbol: transfer.symbol.clone(),
			};
			if !from.is_empty() {
				index.record_outgoing(&from, currency, entry.clone());
			}
			if !to.is_empty() {
				index.record_incoming(&to, currency, entry);
			}
		}
	}
}

/// Fetches every page of one block's transactions and parses them.
pub async fn fetch_block_transfers(
	api: &ProviderApi,
	height: u64,
) -> Result<Vec<TransferTx>, AggregatorError> {
	let metadata = |page: u32| {
		HashMap::from([
			("height".to_string(), height.to_string()),
			("page".to_string(), page.to_string()),
			("provider".to_string(), api.name.clone()),
		])
	};

	let first_page = api
		.client
		.get_block_txs(height, 1)
		.await
		.map_err(|e| {
			AggregatorError::fetch_error(
				"failed to fetch block transactions",
				Some(Box::new(e)),
				Some(metadata(1)),
			)
		})?;
	let validator = api.parser.validator();
	if !validator.validate_block_txs(&first_page) {
		return Err(AggregatorError::fetch_error(
			"block transactions response rejected",
			None,
			Some(metadata(1)),
		));
	}

	let mut transfers = api.parser.parse_block_txs(&first_page);
	if !api.supports_paging {
		return Ok(transfers);
	}

	for page in 2..=api.parser.page_count(&first_page) {
		let raw = api.client.get_block_txs(height, page).await.map_err(|e| {
			AggregatorError::fetch_error(
				"failed to fetch block transactions",
				Some(Box::new(e)),
				Some(metadata(page)),
			)
		})?;
		if !validator.validate_block_txs(&raw) {
			return Err(AggregatorError::fetch_error(
				"block transactions response rejected",
				None,
				Some(metadata(page)),
			));
		}
		transfers.extend(api.parser.parse_block_txs(&raw));
	}
	Ok(transfers)
}
