//! Request parameters shared by token-acquisition calls.

// self
use crate::{_prelude::*, auth::TokenRecord};

/// Controls how the broker treats the cached token.
#[derive(Clone, Debug, Default)]
pub struct TokenRequest {
	/// Bypasses the cache when true.
	pub force: bool,
	/// Window before `exp` during which a cached token counts as expired.
	pub expiry_leeway: Duration,
}
impl TokenRequest {
	/// Creates a request that honors the cache with no leeway.
	pub fn new() -> Self {
		Self::default()
	}

	/// Forces the broker to bypass the cache.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}

	/// Overrides the expiry leeway; negative values clamp to zero.
	pub fn with_expiry_leeway(mut self, leeway: Duration) -> Self {
		self.expiry_leeway = if leeway.is_negative() { Duration::ZERO } else { leeway };

		self
	}

	/// Determines whether the cached record must be replaced.
	pub fn should_refresh(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		self.force || record.is_expired_at(now + self.expiry_leeway)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn record() -> TokenRecord {
		TokenRecord::builder()
			.access_token("cached")
			.expires_at(macros::datetime!(2025-01-01 01:00 UTC))
			.build()
			.expect("Fixture record should build.")
	}

	#[test]
	fn fresh_records_are_reused() {
		let request = TokenRequest::new();

		assert!(!request.should_refresh(&record(), macros::datetime!(2025-01-01 00:59:59 UTC)));
		assert!(request.should_refresh(&record(), macros::datetime!(2025-01-01 01:00 UTC)));
	}

	#[test]
	fn leeway_and_force_trigger_refresh() {
		let now = macros::datetime!(2025-01-01 00:59 UTC);

		assert!(TokenRequest::new().with_expiry_leeway(Duration::minutes(5)).should_refresh(&record(), now));
		assert!(TokenRequest::new().force_refresh().should_refresh(&record(), now));
		assert!(!TokenRequest::new().with_force(false).should_refresh(&record(), now));
	}

	#[test]
	fn negative_leeway_clamps_to_zero() {
		let request = TokenRequest::new().with_expiry_leeway(Duration::minutes(-5));

		assert_eq!(request.expiry_leeway, Duration::ZERO);
	}
}
