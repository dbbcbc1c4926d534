//! Transport error types and handling.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents possible errors while talking to a data provider
#[derive(ThisError, Debug)]
pub enum TransportError {
	/// The request never produced a response (connect, timeout, middleware)
	#[error("HTTP error: {0}")]
	HttpError(ErrorContext),

	/// The provider answered with a non-success status or an undecodable body
	#[error("Response error: {0}")]
	ResponseError(ErrorContext),

	/// The endpoint URL could not be built
	#[error("URL error: {0}")]
	UrlError(ErrorContext),

	/// The provider does not implement the requested operation
	#[error("Unsupported operation: {0}")]
	UnsupportedError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl TransportError {
	// Http error
	pub fn http_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::HttpError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Response error
	pub fn response_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Url error
	pub fn url_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::UrlError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Unsupported operation error
	pub fn unsupported_error(operation: &str) -> Self {
		Self::UnsupportedError(
			ErrorContext::new("operation not supported by this provider", None, None)
				.with_metadata("operation", operation),
		)
	}
}

impl TraceableError for TransportError {
	fn trace_id(&self) -> String {
		match self {
			Self::HttpError(ctx) => ctx.trace_id.clone(),
			Self::ResponseError(ctx) => ctx.trace_id.clone(),
			Self::UrlError(ctx) => ctx.trace_id.clone(),
			Self::UnsupportedError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
