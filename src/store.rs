//! Storage contract and built-in token caches.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenRecord};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the single cached access token.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the cached record, if one is present.
	///
	/// Expired records are returned as-is; freshness is decided by the caller.
	fn fetch(&self) -> StoreFuture<'_, Option<TokenRecord>>;

	/// Persists or replaces the cached record.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Drops the cached record.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Cache contents could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
