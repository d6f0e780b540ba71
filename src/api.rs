//! Bearer-authenticated calls to the screening API.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
	http::{self, ReqwestHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::join_path,
};

/// Sanction lookup path.
pub const SANCTION_PATH: &str = "/api/v1/sanction";

/// Parameters for a sanction lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionQuery {
	/// Project the lookup is billed to.
	pub project: String,
	/// Chain identifier, e.g. `bitcoin_mainnet`.
	pub chain: String,
	/// Address to screen.
	pub address: String,
}
impl SanctionQuery {
	/// Default project for partner credentials.
	pub const DEFAULT_PROJECT: &'static str = "partner";
	/// Default chain.
	pub const DEFAULT_CHAIN: &'static str = "bitcoin_mainnet";
	/// Sample address.
	pub const DEFAULT_ADDRESS: &'static str = "12udabs2TkX7NXCSj6KpqXfakjE52ZPLhz";

	/// Creates a query for `address` on `chain`.
	pub fn new(
		project: impl Into<String>,
		chain: impl Into<String>,
		address: impl Into<String>,
	) -> Self {
		Self { project: project.into(), chain: chain.into(), address: address.into() }
	}

	fn pairs(&self) -> [(&str, &str); 3] {
		[
			("project", self.project.as_str()),
			("chain", self.chain.as_str()),
			("address", self.address.as_str()),
		]
	}
}
impl Default for SanctionQuery {
	fn default() -> Self {
		Self::new(Self::DEFAULT_PROJECT, Self::DEFAULT_CHAIN, Self::DEFAULT_ADDRESS)
	}
}

/// Issues GET requests against the API base with a bearer token.
#[derive(Clone, Debug)]
pub struct ApiClient {
	http_client: Arc<ReqwestHttpClient>,
	api_base: Url,
}
impl ApiClient {
	/// Creates a client rooted at `api_base`.
	pub fn new(http_client: impl Into<Arc<ReqwestHttpClient>>, api_base: Url) -> Self {
		Self { http_client: http_client.into(), api_base }
	}

	/// Base URL paths are appended to.
	pub fn api_base(&self) -> &Url {
		&self.api_base
	}

	/// Looks up sanction status for an address.
	pub async fn sanction(&self, query: &SanctionQuery, bearer: &TokenSecret) -> Result<Value> {
		self.get_json(SANCTION_PATH, &query.pairs(), bearer).await
	}

	/// Calls an arbitrary endpoint below the API base.
	pub async fn get(
		&self,
		path: &str,
		query: &[(String, String)],
		bearer: &TokenSecret,
	) -> Result<Value> {
		let pairs = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<Vec<_>>();

		self.get_json(path, &pairs, bearer).await
	}

	/// Sends `GET <api_base><path>?<query>` and parses the JSON body.
	///
	/// Any non-2xx status is an [`Error::Api`] carrying a preview of the body.
	pub async fn get_json(
		&self,
		path: &str,
		query: &[(&str, &str)],
		bearer: &TokenSecret,
	) -> Result<Value> {
		const KIND: FlowKind = FlowKind::ApiCall;

		let span = FlowSpan::new(KIND, "get_json");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send(path, query, bearer)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn send(&self, path: &str, query: &[(&str, &str)], bearer: &TokenSecret) -> Result<Value> {
		let mut url = join_path(&self.api_base, path)
			.map_err(|source| ConfigError::InvalidUrl { name: "API path", source })?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().copied());
		}

		let response = self
			.http_client
			.get(url)
			.bearer_auth(bearer.expose())
			.send()
			.await
			.map_err(TransportError::api)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::api)?;

		if !status.is_success() {
			return Err(Error::Api {
				status: status.as_u16(),
				body: http::body_preview(&String::from_utf8_lossy(&body)),
			});
		}

		let de = &mut serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(de).map_err(|source| Error::ApiResponse { source })
	}
}
