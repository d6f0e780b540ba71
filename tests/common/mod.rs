//! Helpers shared by the integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use time::OffsetDateTime;
// self
use sanction_client::{
	flows::Broker,
	http::ReqwestHttpClient,
	provider::ProviderDescriptor,
	reqwest::Client,
	store::{MemoryStore, TokenStore},
	url::Url,
};

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";

/// Reqwest transport that accepts the self-signed certificates `httpmock` serves.
pub fn test_http_client() -> Arc<ReqwestHttpClient> {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	Arc::new(ReqwestHttpClient::with_client(client))
}

/// Unsigned JWT whose payload only carries `exp`.
pub fn jwt_with_exp(exp: OffsetDateTime) -> String {
	let payload = format!("{{\"exp\":{}}}", exp.unix_timestamp());

	format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(payload))
}

/// Token endpoint body for `access_token`.
pub fn token_body(access_token: &str) -> String {
	format!("{{\"access_token\":\"{access_token}\",\"token_type\":\"Bearer\",\"expires_in\":86400}}")
}

/// Descriptor whose API base is the mock server root.
pub fn descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder()
		.api_base(Url::parse(&server.base_url()).expect("Mock base URL should parse."))
		.build()
		.expect("Loopback descriptor should build.")
}

/// Broker backed by `store` and pointed at `server`.
pub fn broker_with_store(server: &MockServer, store: Arc<dyn TokenStore>) -> Broker {
	Broker::with_http_client(store, descriptor(server), CLIENT_ID, CLIENT_SECRET, test_http_client())
}

/// Broker backed by a fresh in-memory store.
pub fn memory_broker(server: &MockServer) -> (Broker, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());

	(broker_with_store(server, store.clone()), store)
}
