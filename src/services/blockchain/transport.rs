//! HTTP implementation of [`ProviderClient`].
//!
//! One client instance speaks one provider dialect (OkLink or Blockbook)
//! for one chain. Requests go through retry middleware with exponential
//! backoff; transient failures are retried before an error surfaces.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use url::Url;

use crate::models::ContractInfo;
use crate::services::blockchain::{client::ProviderClient, error::TransportError};
use crate::utils::http::{create_retryable_http_client, RetryConfig};

/// URL dialect of the provider behind an [`HttpProviderClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStyle {
	/// OkLink explorer REST API (`/api/v5/explorer/...`)
	OkLink,
	/// Blockbook REST API (`/api/v2/...`)
	Blockbook,
}

/// HTTP client for one provider endpoint.
#[derive(Clone)]
pub struct HttpProviderClient {
	client: ClientWithMiddleware,
	base_url: Url,
	style: RouteStyle,
	/// Provider-side chain identifier, e.g. "AVAXC" for OkLink
	chain_short_name: String,
	api_key: Option<String>,
}

impl HttpProviderClient {
	/// Creates a client with default timeouts and retry policy.
	pub fn new(
		base_url: &str,
		style: RouteStyle,
		chain_short_name: impl Into<String>,
		api_key: Option<String>,
	) -> Result<Self, anyhow::Error> {
		Self::with_retry_config(base_url, style, chain_short_name, api_key, RetryConfig::default())
	}

	/// Creates a client with an explicit retry policy.
	pub fn with_retry_config(
		base_url: &str,
		style: RouteStyle,
		chain_short_name: impl Into<String>,
		api_key: Option<String>,
		retry_config: RetryConfig,
	) -> Result<Self, anyhow::Error> {
		let base_url = Url::parse(base_url)
			.map_err(|e| anyhow::anyhow!("invalid provider base URL {}: {}", base_url, e))?;

		let base_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(Duration::from_secs(30))
			.connect_timeout(Duration::from_secs(20))
			.build()
			.map_err(|e| anyhow::anyhow!("failed to create base HTTP client: {}", e))?;

		Ok(Self {
			client: create_retryable_http_client(&retry_config, base_client),
			base_url,
			style,
			chain_short_name: chain_short_name.into(),
			api_key,
		})
	}

	fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
		self.base_url.join(path).map_err(|e| {
			TransportError::url_error(
				"failed to build endpoint URL",
				Some(Box::new(e)),
				Some(HashMap::from([("path".to_string(), path.to_string())])),
			)
		})
	}

	async fn get_json(
		&self,
		path: &str,
		query: &[(&str, String)],
	) -> Result<Value, TransportError> {
		let url = self.endpoint(path)?;
		let metadata = || {
			HashMap::from([
				("url".to_string(), url.to_string()),
				("chain".to_string(), self.chain_short_name.clone()),
			])
		};

		let mut request = self.client.get(url.clone());
		if !query.is_empty() {
			request = request.query(query);
		}
		if let Some(key) = &self.api_key {
			request = request.header("Ok-Access-Key", key);
		}

		let response = request.send().await.map_err(|e| {
			TransportError::http_error("request failed", Some(Box::new(e)), Some(metadata()))
		})?;

		let status = response.status();
		if !status.is_success() {
			return Err(TransportError::response_error(
				format!("provider returned status {}", status.as_u16()),
				None,
				Some(metadata()),
			));
		}

		response.json::<Value>().await.map_err(|e| {
			TransportError::response_error(
				"response body is not valid JSON",
				Some(Box::new(e)),
				Some(metadata()),
			)
		})
	}

	fn chain_query(&self) -> (&'static str, String) {
		("chainShortName", self.chain_short_name.clone())
	}
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
	async fn get_balance(&self, address: &str) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/address/address-summary",
					&[self.chain_query(), ("address", address.to_string())],
				)
				.await
			}
			RouteStyle::Blockbook => {
				self.get_json(
					&format!("api/v2/address/{}", address),
					&[("details", "basic".to_string())],
				)
				.await
			}
		}
	}

	async fn get_balances(&self, addresses: &[String]) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/address/balance-multi",
					&[self.chain_query(), ("address", addresses.join(","))],
				)
				.await
			}
			RouteStyle::Blockbook => Err(TransportError::unsupported_error("get_balances")),
		}
	}

	async fn get_token_balance(
		&self,
		address: &str,
		contract: &ContractInfo,
	) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/address/token-balance",
					&[
						self.chain_query(),
						("address", address.to_string()),
						("tokenContractAddress", contract.address.clone()),
						("protocolType", "token_20".to_string()),
					],
				)
				.await
			}
			RouteStyle::Blockbook => Err(TransportError::unsupported_error("get_token_balance")),
		}
	}

	async fn get_token_balances(
		&self,
		addresses: &[String],
		contract: &ContractInfo,
	) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/address/token-balance-multi",
					&[
						self.chain_query(),
						("address", addresses.join(",")),
						("tokenContractAddress", contract.address.clone()),
						("protocolType", "token_20".to_string()),
					],
				)
				.await
			}
			RouteStyle::Blockbook => Err(TransportError::unsupported_error("get_token_balances")),
		}
	}

	async fn get_tx_details(&self, tx_hash: &str) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/transaction/transaction-fills",
					&[self.chain_query(), ("txid", tx_hash.to_string())],
				)
				.await
			}
			RouteStyle::Blockbook => self.get_json(&format!("api/v2/tx/{}", tx_hash), &[]).await,
		}
	}

	async fn get_address_txs(&self, address: &str) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/address/transaction-list",
					&[
						self.chain_query(),
						("address", address.to_string()),
						("limit", "50".to_string()),
					],
				)
				.await
			}
			RouteStyle::Blockbook => {
				self.get_json(
					&format!("api/v2/address/{}", address),
					&[
						("details", "txs".to_string()),
						("pageSize", "50".to_string()),
					],
				)
				.await
			}
		}
	}

	async fn get_token_txs(
		&self,
		address: &str,
		contract: &ContractInfo,
	) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/address/transaction-list",
					&[
						self.chain_query(),
						("address", address.to_string()),
						("tokenContractAddress", contract.address.clone()),
						("protocolType", "token_20".to_string()),
						("limit", "50".to_string()),
					],
				)
				.await
			}
			RouteStyle::Blockbook => Err(TransportError::unsupported_error("get_token_txs")),
		}
	}

	async fn get_block_txs(&self, height: u64, page: u32) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json(
					"api/v5/explorer/block/transaction-list",
					&[
						self.chain_query(),
						("height", height.to_string()),
						("page", page.to_string()),
						("limit", "100".to_string()),
					],
				)
				.await
			}
			RouteStyle::Blockbook => {
				self.get_json(
					&format!("api/v2/block/{}", height),
					&[("page", page.to_string())],
				)
				.await
			}
		}
	}

	async fn get_block_head(&self) -> Result<Value, TransportError> {
		match self.style {
			RouteStyle::OkLink => {
				self.get_json("api/v5/explorer/blockchain/info", &[self.chain_query()])
					.await
			}
			RouteStyle::Blockbook => self.get_json("api/", &[]).await,
		}
	}
}
