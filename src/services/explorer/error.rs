//! Explorer error types and handling.

use crate::services::aggregator::AggregatorError;
use crate::services::blockchain::TransportError;
use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents possible errors raised by the explorer facade
#[derive(ThisError, Debug)]
pub enum ExplorerError {
	/// A provider response was rejected before parsing
	#[error("Validation error: {0}")]
	ValidationError(ErrorContext),

	/// A validated response could not be normalized
	#[error("Parse error: {0}")]
	ParseError(ErrorContext),

	/// No usable provider for the requested operation
	#[error("Provider error: {0}")]
	ProviderError(ErrorContext),

	/// Transport failures propagate unchanged
	#[error(transparent)]
	TransportError(#[from] TransportError),

	/// Aggregation failures, including cursor conflicts
	#[error(transparent)]
	AggregatorError(#[from] AggregatorError),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ExplorerError {
	// Validation error
	pub fn validation_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ValidationError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Parse error
	pub fn parse_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ParseError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Provider error
	pub fn provider_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ProviderError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for ExplorerError {
	fn trace_id(&self) -> String {
		match self {
			Self::ValidationError(ctx) => ctx.trace_id.clone(),
			Self::ParseError(ctx) => ctx.trace_id.clone(),
			Self::ProviderError(ctx) => ctx.trace_id.clone(),
			Self::TransportError(err) => err.trace_id(),
			Self::AggregatorError(err) => err.trace_id(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
