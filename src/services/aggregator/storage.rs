//! Cursor storage for the aggregation engine.
//!
//! A cursor is the highest block height fully processed for one chain. The
//! only write path that matters for correctness is compare-and-swap: a run
//! persists its window end only if the cursor still holds the value it read
//! at the start, so two racing runs can never both advance it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Interface for cursor storage implementations
#[async_trait]
pub trait CursorStore: Send + Sync {
	/// Retrieves the cursor value, or None when no cursor exists yet
	async fn get(&self, key: &str) -> Result<Option<u64>, anyhow::Error>;

	/// Unconditionally sets the cursor value
	async fn set(&self, key: &str, height: u64) -> Result<(), anyhow::Error>;

	/// Sets the cursor to `new` only if it currently holds `expected`.
	/// Returns false without writing when the comparison fails.
	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<u64>,
		new: u64,
	) -> Result<bool, anyhow::Error>;

	/// Removes the cursor, resetting the chain to bootstrap behavior
	async fn delete(&self, key: &str) -> Result<(), anyhow::Error>;
}

/// In-memory cursor store, for tests and single-process setups.
#[derive(Default)]
pub struct InMemoryCursorStore {
	cursors: Mutex<HashMap<String, u64>>,
}

impl InMemoryCursorStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
	async fn get(&self, key: &str) -> Result<Option<u64>, anyhow::Error> {
		Ok(self.cursors.lock().await.get(key).copied())
	}

	async fn set(&self, key: &str, height: u64) -> Result<(), anyhow::Error> {
		self.cursors.lock().await.insert(key.to_string(), height);
		Ok(())
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<u64>,
		new: u64,
	) -> Result<bool, anyhow::Error> {
		let mut cursors = self.cursors.lock().await;
		if cursors.get(key).copied() != expected {
			return Ok(false);
		}
		cursors.insert(key.to_string(), new);
		Ok(true)
	}

	async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
		self.cursors.lock().await.remove(key);
		Ok(())
	}
}

/// File-based cursor store.
///
/// Each cursor lives in its own file, "{key}.txt" under the storage path.
/// Compare-and-swap is serialized through an internal lock, so the check
/// and the write are atomic within one process.
pub struct FileCursorStore {
	storage_path: PathBuf,
	write_lock: Mutex<()>,
}

impl FileCursorStore {
	pub fn new(storage_path: PathBuf) -> Self {
		Self {
			storage_path,
			write_lock: Mutex::new(()),
		}
	}

	fn cursor_file(&self, key: &str) -> PathBuf {
		self.storage_path.join(format!("{}.txt", key))
	}

	async fn read_cursor(&self, key: &str) -> Result<Option<u64>, anyhow::Error> {
		let file_path = self.cursor_file(key);
		if !file_path.exists() {
			return Ok(None);
		}
		let content = tokio::fs::read_to_string(file_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to read cursor: {}", e))?;
		let height = content
			.trim()
			.parse::<u64>()
			.map_err(|e| anyhow::anyhow!("Failed to parse cursor: {}", e))?;
		Ok(Some(height))
	}

	async fn write_cursor(&self, key: &str, height: u64) -> Result<(), anyhow::Error> {
		tokio::fs::write(self.cursor_file(key), height.to_string())
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save cursor: {}", e))
	}
}

impl Default for FileCursorStore {
	/// Initializes storage with the default path "data"
	fn default() -> Self {
		FileCursorStore::new(PathBuf::from("data"))
	}
}

#[async_trait]
impl CursorStore for FileCursorStore {
	async fn get(&self, key: &str) -> Result<Option<u64>, anyhow::Error> {
		let _guard = self.write_lock.lock().await;
		self.read_cursor(key).await
	}

	async fn set(&self, key: &str, height: u64) -> Result<(), anyhow::Error> {
		let _guard = self.write_lock.lock().await;
		self.write_cursor(key, height).await
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<u64>,
		new: u64,
	) -> Result<bool, anyhow::Error> {
		let _guard = self.write_lock.lock().await;
		if self.read_cursor(key).await? != expected {
			return Ok(false);
		}
		self.write_cursor(key, new).await?;
		Ok(true)
	}

	async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
		let _guard = self.write_lock.lock().await;
		let file_path = self.cursor_file(key);
		if !file_path.exists() {
			return Ok(());
		}
		tokio::fs::remove_file(file_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to delete cursor: {}", e))
	}
}
