//! A normalization layer over third-party blockchain data providers.
//!
//! Exchanges and wallets read balances, transactions and whole block ranges
//! from public explorer APIs (OkLink, Blockbook and the like). Every provider
//! speaks a different dialect: different field names, different units,
//! different ideas of what a failed transaction looks like. This crate turns
//! those dialects into one canonical data model:
//!
//! - [`services::explorer::ExplorerInterface`] - uniform facade over
//!   chain/provider specifics (balances, transaction details, address
//!   transactions, block transactions)
//! - [`services::validator`] - per-provider response validation, rejecting
//!   payloads before any parsing happens
//! - [`services::parser`] - per-chain parsers producing normalized transfer
//!   records with exact decimal amounts
//! - [`services::aggregator`] - incremental block-window aggregation with a
//!   persisted cursor, for address-activity indexing
//! - [`services::blockchain`] - raw provider clients and the HTTP transport
//!
//! All monetary amounts are [`rust_decimal::Decimal`] values in human units;
//! base-unit scaling happens exactly once, at parse time, using the static
//! per-chain configuration in [`models`].

pub mod models;
pub mod services;
pub mod utils;
