//! Block-window aggregation with a persisted cursor.

mod error;
mod service;
mod storage;

pub use error::AggregatorError;
pub use service::{fetch_block_transfers, BlockAggregation, BlockAggregator};
pub use storage::{CursorStore, FileCursorStore, InMemoryCursorStore};
