//! Client Credentials flow with a single cached token.
//!
//! [`Broker::client_credentials`] serves the stored token while it is fresh and otherwise makes
//! exactly one token-endpoint call, storing the result before returning it. Cache failures never
//! fail the call: an unreadable cache counts as a miss and a failed write is only logged.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	flows::{Broker, common::TokenRequest},
	oauth::TokenFacade,
	obs::{self, CacheEvent, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderStrategy,
	store::TokenStore,
};

impl Broker {
	/// Returns a usable token, fetching and caching a new one when needed.
	pub async fn client_credentials(&self, request: TokenRequest) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		let span = FlowSpan::new(KIND, "client_credentials");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(current) = self.cached(&request).await {
					return Ok(current);
				}

				let mut form = BTreeMap::new();

				<dyn ProviderStrategy>::augment_token_request(
					self.strategy.as_ref(),
					&self.descriptor,
					&mut form,
				);

				let extra_params: Vec<(String, String)> = form.into_iter().collect();
				let facade = TokenFacade::from_descriptor(
					&self.descriptor,
					&self.client_id,
					&self.client_secret,
					self.http_client.clone(),
				);
				let record = facade
					.exchange_client_credentials(self.strategy.as_ref(), extra_params.as_slice())
					.await?;

				obs::log_token_fetched(record.expires_at);
				self.store_fetched(record.clone()).await;

				Ok(record)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Convenience wrapper returning only the bearer secret.
	pub async fn access_token(&self, request: TokenRequest) -> Result<TokenSecret> {
		self.client_credentials(request).await.map(|record| record.access_token)
	}

	async fn cached(&self, request: &TokenRequest) -> Option<TokenRecord> {
		if request.force {
			observe_cache(CacheEvent::Miss, None);

			return None;
		}

		let now = OffsetDateTime::now_utc();

		match <dyn TokenStore>::fetch(self.store.as_ref()).await {
			Ok(Some(record)) if !request.should_refresh(&record, now) => {
				observe_cache(CacheEvent::Hit, None);

				Some(record)
			},
			Ok(_) => {
				observe_cache(CacheEvent::Miss, None);

				None
			},
			Err(e) => {
				observe_cache(CacheEvent::ReadError, Some(&e));

				None
			},
		}
	}

	async fn store_fetched(&self, record: TokenRecord) {
		match <dyn TokenStore>::save(self.store.as_ref(), record).await {
			Ok(()) => observe_cache(CacheEvent::Write, None),
			Err(e) => observe_cache(CacheEvent::WriteError, Some(&e)),
		}
	}
}

fn observe_cache(event: CacheEvent, error: Option<&dyn Display>) {
	obs::record_cache_event(event);
	obs::log_cache_event(event, error);
}
