//! Token acquisition orchestrated over a store, a provider descriptor, and the shared transport.

pub mod common;

mod client_credentials;

pub use common::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HttpOptions, ReqwestHttpClient},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	store::TokenStore,
};

/// Hands out access tokens, reusing the cached one until it expires.
///
/// The broker owns the HTTP client, token store, provider descriptor, and strategy so
/// callers only decide which store to use and whether to force a refresh.
#[derive(Clone)]
pub struct Broker {
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<ReqwestHttpClient>,
	/// Token store implementation that persists issued tokens.
	pub store: Arc<dyn TokenStore>,
	/// Provider descriptor that defines endpoints and the audience.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for request augmentation and error classification.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	client_secret: String,
}
impl Broker {
	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		http_client: impl Into<Arc<ReqwestHttpClient>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			descriptor,
			strategy: Arc::new(DefaultProviderStrategy),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
		}
	}

	/// Creates a broker with its own reqwest transport built from default [`HttpOptions`].
	pub fn new(
		store: Arc<dyn TokenStore>,
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::new(&HttpOptions::default())?;

		Ok(Self::with_http_client(store, descriptor, client_id, client_secret, http_client))
	}

	/// Replaces the provider strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.finish()
	}
}
