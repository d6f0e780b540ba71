//! Process-local [`TokenStore`] that keeps the token for the lifetime of the client.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{StoreError, StoreFuture, TokenStore},
};

type Slot = Arc<RwLock<Option<TokenRecord>>>;

/// Thread-safe in-memory slot holding at most one token record.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store pre-populated with `record`.
	pub fn with_record(record: TokenRecord) -> Self {
		Self(Arc::new(RwLock::new(Some(record))))
	}

	fn save_now(slot: Slot, record: TokenRecord) -> Result<(), StoreError> {
		*slot.write() = Some(record);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn fetch(&self) -> StoreFuture<'_, Option<TokenRecord>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::save_now(slot, record) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
