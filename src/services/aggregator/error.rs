//! Aggregation error types and handling.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents possible errors during block-window aggregation
#[derive(ThisError, Debug)]
pub enum AggregatorError {
	/// The cursor moved between read and persist; the run is discarded
	#[error("Cursor conflict error: {0}")]
	CursorConflictError(ErrorContext),

	/// Cursor storage failed to read or write
	#[error("Storage error: {0}")]
	StorageError(ErrorContext),

	/// A block inside the window could not be fetched or was rejected
	#[error("Fetch error: {0}")]
	FetchError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl AggregatorError {
	// Cursor conflict error
	pub fn cursor_conflict_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::CursorConflictError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Storage error
	pub fn storage_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::StorageError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Fetch error
	pub fn fetch_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::FetchError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for AggregatorError {
	fn trace_id(&self) -> String {
		match self {
			Self::CursorConflictError(ctx) => ctx.trace_id.clone(),
			Self::StorageError(ctx) => ctx.trace_id.clone(),
			Self::FetchError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::{Error as IoError, ErrorKind};

	#[test]
	fn test_cursor_conflict_formatting() {
		let error = AggregatorError::cursor_conflict_error(
			"cursor changed underneath the run",
			None,
			Some(HashMap::from([(
				"key".to_string(),
				"latest_block_height_processed_avax".to_string(),
			)])),
		);
		assert_eq!(
			error.to_string(),
			"Cursor conflict error: cursor changed underneath the run \
			 [key=latest_block_height_processed_avax]"
		);
	}

	#[test]
	fn test_storage_error_keeps_source() {
		let source = IoError::new(ErrorKind::PermissionDenied, "read-only data dir");
		let error =
			AggregatorError::storage_error("cursor write failed", Some(Box::new(source)), None);
		assert_eq!(error.to_string(), "Storage error: cursor write failed");
		if let AggregatorError::StorageError(ctx) = &error {
			assert_eq!(ctx.source.as_ref().unwrap().to_string(), "read-only data dir");
		} else {
			panic!("expected StorageError variant");
		}
	}

	#[test]
	fn test_trace_id_propagation() {
		let ctx = ErrorContext::new("inner", None, None);
		let trace_id = ctx.trace_id.clone();
		let error = AggregatorError::FetchError(ctx);
		assert_eq!(error.trace_id(), trace_id);
	}
}
