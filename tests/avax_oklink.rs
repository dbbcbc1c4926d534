//! Avalanche C-Chain scenarios against an OkLink-shaped provider.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use chain_explorer::models::{chain, CurrencyId, Direction, TransferKind, AVAX_CONTRACTS};
use chain_explorer::services::aggregator::{AggregatorError, CursorStore, InMemoryCursorStore};
use chain_explorer::services::blockchain::{ProviderApi, ProviderRegistry};
use chain_explorer::services::explorer::{ExplorerError, ExplorerInterface};
use chain_explorer::services::parser::oklink::OkLinkParser;
use chain_explorer::utils::tests::{
	oklink_block_head, oklink_block_page, oklink_block_tx, oklink_envelope, oklink_failed_block_tx,
	MockProviderClient,
};

const CURSOR_KEY: &str = "latest_block_height_processed_avax";
const AVAX: CurrencyId = CurrencyId(57);

const RECEIVER: &str = "0x9f8c163cba728e99993abe7495f06c0a3c8ac8b9";
const FAN_OUT_SENDER: &str = "0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8";
const SMALL_SENDER: &str = "0xaec0f27fdf4e533f5e32177beba2ee6f3845f47b";

fn sender(i: u32) -> String {
	format!("0xf{:039x}", i)
}

fn explorer_with(
	client: MockProviderClient,
	store: Arc<dyn CursorStore>,
) -> ExplorerInterface {
	let mut registry = ProviderRegistry::new();
	registry.register_all(Arc::new(ProviderApi {
		name: "oklink".to_string(),
		client: Arc::new(client),
		parser: Arc::new(OkLinkParser::new(chain("avax").unwrap())),
		needs_block_head: true,
		supports_paging: true,
	}));
	ExplorerInterface::new(chain("avax").unwrap(), registry, store)
}

fn dec(s: &str) -> Decimal {
	Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn main_coin_tx_details() {
	let client = MockProviderClient::new()
		.with_block_head(oklink_block_head(39394770))
		.with_tx_details(oklink_envelope(json!({
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
		})));
	let explorer = explorer_with(client, Arc::new(InMemoryCursorStore::new()));

	let detail = explorer
		.get_tx_details("0xcb02eca856eb0e4e5c0fc95c268b68edc361a442ea41095259fbb0ca477654cd")
		.await
		.unwrap();

	assert!(detail.success);
	assert_eq!(detail.block, Some(38301393));
	assert_eq!(detail.fees, Some(dec("0.000546")));
	assert_eq!(detail.confirmations, Some(1093377));
	assert_eq!(detail.transfers.len(), 1);

	let transfer = &detail.transfers[0];
	assert_eq!(transfer.kind, TransferKind::MainCoin);
	assert_eq!(transfer.currency, AVAX);
	assert_eq!(transfer.value, dec("1.432361"));
	assert_eq!(
		transfer.from_address,
		"0xb985cf3042a9ce3a2dc48399f8e39d7119d39d6f"
	);
	assert_eq!(
		transfer.to_address,
		"0x2f13d388b85e0ecd32e7c3d7f36d1053354ef104"
	);
}

#[tokio::test]
async fn token_tx_details() {
	let client = MockProviderClient::new()
		.with_block_head(oklink_block_head(38300000))
		.with_tx_details(oklink_envelope(json!({
			"txid": "0xd78bcd9e08b5b1f1ad7b3bfdf801c66a6e1acd9f4b4a5f8ba9c9e2a75ba65c11",
			"height": "38299000",
			"transactionTime": "1701070000000",
			"txfee": "0.001",
			"state": "success",
			"methodId": "0xa9059cbb",
			"tokenTransferDetails": [{
				"from": "0x06b7b1d53d0bb8e4860026fbb76c15b4a07e5b68",
				"to": "0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8",
				"amount": "499",
				"symbol": "USDt",
				"tokenContractAddress": "0x9702230A8Ea53601f5cD2dc00fDBc13d4dF4A8c7"
			}]
		})));
	let explorer = explorer_with(client, Arc::new(InMemoryCursorStore::new()));

	let detail = explorer
		.get_tx_details("0xd78bcd9e08b5b1f1ad7b3bfdf801c66a6e1acd9f4b4a5f8ba9c9e2a75ba65c11")
		.await
		.unwrap();

	assert!(detail.success);
	let transfer = &detail.transfers[0];
	assert_eq!(transfer.kind, TransferKind::Token);
	assert_eq!(transfer.currency, CurrencyId(13));
	assert_eq!(transfer.value, dec("499"));
	assert_eq!(
		transfer.token.as_deref(),
		Some("0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7")
	);
	// head 38300000 - height 38299000
	assert_eq!(detail.confirmations, Some(1000));
}

#[tokio::test]
async fn ambiguous_token_details_degrade_to_failed() {
	let entry = json!({
		"from": "0x06b7b1d53d0bb8e4860026fbb76c15b4a07e5b68",
		"to": "0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8",
		"amount": "499",
		"symbol": "USDt",
		"tokenContractAddress": "0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7"
	});
	let client = MockProviderClient::new()
		.with_block_head(oklink_block_head(38300000))
		.with_tx_details(oklink_envelope(json!({
			"txid": "0xd78b",
			"state": "success",
			"methodId": "0xa9059cbb",
			"tokenTransferDetails": [entry.clone(), entry]
		})));
	let explorer = explorer_with(client, Arc::new(InMemoryCursorStore::new()));

	let detail = explorer.get_tx_details("0xd78b").await.unwrap();
	assert!(!detail.success);
	assert!(detail.transfers.is_empty());
	assert_eq!(detail.hash, "0xd78b");
}

#[tokio::test]
async fn token_balance_uses_contract_registry() {
	let client = MockProviderClient::new()
		.with_token_balance(oklink_envelope(json!({
			"tokenList": [{"holdingAmount": "1250.5", "symbol": "USDT"}]
		})));
	let explorer = explorer_with(client, Arc::new(InMemoryCursorStore::new()));

	let balance = explorer
		.get_token_balance("0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8", &AVAX_CONTRACTS)
		.await
		.unwrap();
	assert_eq!(balance.amount, dec("1250.5"));
	assert_eq!(balance.symbol, "USDT");
	assert_eq!(
		balance.token.as_deref(),
		Some("0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7")
	);
}

#[tokio::test]
async fn rejected_balance_payload_is_a_validation_error() {
	let client = MockProviderClient::new()
		.with_balance(json!({"code": "50011", "msg": "rate limited", "data": []}));
	let explorer = explorer_with(client, Arc::new(InMemoryCursorStore::new()));

	let result = explorer
		.get_balance("0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8")
		.await;
	assert!(matches!(result, Err(ExplorerError::ValidationError(_))));
}

#[tokio::test]
async fn address_txs_direction_and_sign() {
	let me = "0x9430801ebaf509ad49202aabc5f5bc6fd8a3daf8";
	let other = "0xd1c4c01a385b05224dbc6ec95526d5a8d9221a3b";
	let client = MockProviderClient::new()
		.with_block_head(oklink_block_head(38311100))
		.with_address_txs(oklink_envelope(json!({
			"transactionLists": [
				oklink_block_tx("0xout", 38311000, me, other, "0.06"),
				oklink_block_tx("0xin", 38311001, other, me, "1.25")
			]
		})));
	let explorer = explorer_with(client, Arc::new(InMemoryCursorStore::new()));

	let txs = explorer.get_address_txs(me, None).await.unwrap();
	assert_eq!(txs.len(), 2);
	assert_eq!(txs[0].direction, Direction::Outgoing);
	assert_eq!(txs[0].amount, dec("-0.06"));
	assert_eq!(txs[0].confirmations, Some(100));
	assert_eq!(txs[1].direction, Direction::Incoming);
	assert_eq!(txs[1].amount, dec("1.25"));

	let incoming_only = explorer
		.get_address_txs(me, Some(Direction::Incoming))
		.await
		.unwrap();
	assert_eq!(incoming_only.len(), 1);
	assert_eq!(incoming_only[0].hash, "0xin");
}

/// Five-block window with twelve deposits to one receiver, a fan-out
/// sender, one small transfer and one failed transaction.
fn window_fixture() -> MockProviderClient {
	let mut client = MockProviderClient::new().with_block_head(oklink_block_head(38311001));

	client.push_block(
		38310997,
		1,
		oklink_block_page(
			1,
			vec![
				oklink_block_tx("0xi01", 38310997, &sender(1), RECEIVER, "1435.03916682"),
				oklink_block_tx("0xi02", 38310997, &sender(2), RECEIVER, "1371.39908278"),
				oklink_block_tx(
					"0xo01",
					38310997,
					FAN_OUT_SENDER,
					"0xd1c4c01a385b05224dbc6ec95526d5a8d9221a3b",
					"0.06",
				),
			],
		),
	);
	client.push_block(
		38310998,
		1,
		oklink_block_page(
			1,
			vec![
				oklink_block_tx("0xi03", 38310998, &sender(3), RECEIVER, "1195.099475"),
				oklink_block_tx("0xi04", 38310998, &sender(4), RECEIVER, "594.94"),
				oklink_block_tx("0xi05", 38310998, &sender(5), RECEIVER, "374.624475"),
				oklink_block_tx("0xi06", 38310998, &sender(6), RECEIVER, "271.730895"),
				oklink_failed_block_tx(
					"0xfail",
					38310998,
					"0xdead00000000000000000000000000000000dead",
					"0xbeef00000000000000000000000000000000beef",
				),
			],
		),
	);
	client.push_block(
		38310999,
		1,
		oklink_block_page(
			1,
			vec![
				oklink_block_tx("0xi07", 38310999, &sender(7), RECEIVER, "54.9958"),
				oklink_block_tx(
					"0xo02",
					38310999,
					FAN_OUT_SENDER,
					"0x6b1a5b7d3c8e2f4a9d0c1b2a3e4f5d6c7b8a9e0f",
					"0.06",
				),
				oklink_block_tx(
					"0xo03",
					38310999,
					SMALL_SENDER,
					"0xd09381c3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9",
					"0.02350942649055",
				),
			],
		),
	);
	client.push_block(
		38311000,
		1,
		oklink_block_page(
			1,
			vec![
				oklink_block_tx("0xi08", 38311000, &sender(8), RECEIVER, "51.499475"),
				oklink_block_tx(
					"0xi09",
					38311000,
					&sender(9),
					RECEIVER,
					"43.561968485362665",
				),
				oklink_block_tx(
					"0xo04",
					38311000,
					FAN_OUT_SENDER,
					"0xbb5b1912c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8",
					"0.06",
				),
			],
		),
	);
	client.push_block(
		38311001,
		1,
		oklink_block_page(
			1,
			vec![
				oklink_block_tx(
					"0xi10",
					38311001,
					&sender(10),
					RECEIVER,
					"41.632476077155082533",
				),
				oklink_block_tx("0xi11", 38311001, &sender(11), RECEIVER, "36.999475"),
				oklink_block_tx("0xi12", 38311001, &sender(12), RECEIVER, "34.963797"),
			],
		),
	);
	client
}

#[tokio::test]
async fn block_window_aggregation() {
	let store = Arc::new(InMemoryCursorStore::new());
	store.set(CURSOR_KEY, 38310996).await.unwrap();
	let explorer = explorer_with(window_fixture(), store.clone());

	let result = explorer.get_latest_block(true, true).await.unwrap();
	assert_eq!(result.latest_block_processed, 38311001);
	assert_eq!(store.get(CURSOR_KEY).await.unwrap(), Some(38311001));

	// Twelve deposits, ascending block-height order
	let refs = &result.index.incoming_txs[RECEIVER][&AVAX];
	assert_eq!(refs.len(), 12);
	let heights: Vec<u64> = refs.iter().map(|r| r.block_height).collect();
	let mut sorted = heights.clone();
	sorted.sort_unstable();
	assert_eq!(heights, sorted);
	let values: Vec<Decimal> = refs.iter().map(|r| r.value).collect();
	let expected: Vec<Decimal> = [
		"1435.03916682",
		"1371.39908278",
		"1195.099475",
		"594.94",
		"374.624475",
		"271.730895",
		"54.9958",
		"51.499475",
		"43.561968485362665",
		"41.632476077155082533",
		"36.999475",
		"34.963797",
	]
	.iter()
	.map(|s| dec(s))
	.collect();
	assert_eq!(values, expected);

	// Fan-out sender spent three times, in three different blocks
	let outgoing = &result.index.outgoing_txs[FAN_OUT_SENDER][&AVAX];
	assert_eq!(outgoing.len(), 3);
	assert!(outgoing.iter().all(|r| r.value == dec("0.06")));
	assert_eq!(
		outgoing.iter().map(|r| r.block_height).collect::<Vec<_>>(),
		vec![38310997, 38310999, 38311000]
	);

	let small = &result.index.outgoing_txs[SMALL_SENDER][&AVAX];
	assert_eq!(small.len(), 1);
	assert_eq!(small[0].value, dec("0.02350942649055"));

	// Failed transaction names its participants but moves no money
	assert!(result
		.index
		.input_addresses
		.contains("0xdead00000000000000000000000000000000dead"));
	assert!(result
		.index
		.output_addresses
		.contains("0xbeef00000000000000000000000000000000beef"));
	assert!(!result
		.index
		.outgoing_txs
		.contains_key("0xdead00000000000000000000000000000000dead"));
	assert!(!result
		.index
		.incoming_txs
		.contains_key("0xbeef00000000000000000000000000000000beef"));

	// Every monetary participant also shows up in the participant sets
	for address in result.index.outgoing_txs.keys() {
		assert!(result.index.input_addresses.contains(address));
	}
	for address in result.index.incoming_txs.keys() {
		assert!(result.index.output_addresses.contains(address));
	}
}

#[tokio::test]
async fn aggregation_is_idempotent_at_head() {
	let store = Arc::new(InMemoryCursorStore::new());
	store.set(CURSOR_KEY, 38310996).await.unwrap();
	let explorer = explorer_with(window_fixture(), store.clone());

	let first = explorer.get_latest_block(true, true).await.unwrap();
	assert!(!first.index.is_empty());

	// Head unchanged: the second run walks nothing and touches nothing
	let second = explorer.get_latest_block(true, true).await.unwrap();
	assert!(second.index.is_empty());
	assert_eq!(second.latest_block_processed, 38311001);
	assert_eq!(store.get(CURSOR_KEY).await.unwrap(), Some(38311001));
}

#[tokio::test]
async fn failed_window_leaves_cursor_untouched() {
	let mut client = window_fixture();
	client.fail_block(38310999);

	let store = Arc::new(InMemoryCursorStore::new());
	store.set(CURSOR_KEY, 38310996).await.unwrap();
	let explorer = explorer_with(client, store.clone());

	let result = explorer.get_latest_block(true, true).await;
	assert!(matches!(
		result,
		Err(ExplorerError::AggregatorError(AggregatorError::FetchError(_)))
	));
	assert_eq!(store.get(CURSOR_KEY).await.unwrap(), Some(38310996));

	// A retry against a healthy provider re-walks the identical range
	let explorer = explorer_with(window_fixture(), store.clone());
	let result = explorer.get_latest_block(true, true).await.unwrap();
	assert_eq!(result.latest_block_processed, 38311001);
	assert_eq!(result.index.incoming_txs[RECEIVER][&AVAX].len(), 12);
}

#[tokio::test]
async fn get_block_txs_reads_every_page() {
	let mut client = MockProviderClient::new().with_block_head(oklink_block_head(38311001));
	client.push_block(
		38310997,
		1,
		oklink_block_page(
			2,
			vec![oklink_block_tx("0x1", 38310997, &sender(1), RECEIVER, "1.0")],
		),
	);
	client.push_block(
		38310997,
		2,
		oklink_block_page(
			2,
			vec![oklink_block_tx("0x2", 38310997, &sender(2), RECEIVER, "2.0")],
		),
	);
	let explorer = explorer_with(client, Arc::new(InMemoryCursorStore::new()));

	let transfers = explorer.get_block_txs(38310997).await.unwrap();
	assert_eq!(transfers.len(), 2);
	assert_eq!(transfers[1].value, dec("2.0"));
}
