mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use sanction_client::{
	api::{ApiClient, SANCTION_PATH, SanctionQuery},
	auth::TokenSecret,
	cli,
	error::Error,
	flows::TokenRequest,
	url::Url,
};

fn api_client(server: &MockServer) -> ApiClient {
	ApiClient::new(test_http_client(), Url::parse(&server.base_url()).expect("Mock URL should parse."))
}

fn bearer(value: &str) -> TokenSecret {
	TokenSecret::new(value)
}

#[tokio::test]
async fn sanction_lookup_sends_bearer_and_query() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(SANCTION_PATH)
				.header("authorization", "Bearer token-123")
				.query_param("project", "partner")
				.query_param("chain", "bitcoin_mainnet")
				.query_param("address", "12udabs2TkX7NXCSj6KpqXfakjE52ZPLhz");
			then.status(200).header("content-type", "application/json").body("{\"isSanctioned\":true}");
		})
		.await;
	let value = api_client(&server)
		.sanction(&SanctionQuery::default(), &bearer("token-123"))
		.await
		.expect("Sanction lookup should succeed.");

	assert_eq!(value, json!({ "isSanctioned": true }));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_is_fetched_before_the_api_call() {
	let server = MockServer::start_async().await;
	let (broker, _store) = memory_broker(&server);
	let jwt = jwt_with_exp(OffsetDateTime::now_utc() + Duration::hours(1));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(token_body(&jwt));
		})
		.await;
	let authorization = format!("Bearer {jwt}");
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/risk").header("authorization", &authorization);
			then.status(200).header("content-type", "application/json").body("{\"risk\":0}");
		})
		.await;
	let token = broker.access_token(TokenRequest::new()).await.expect("Token should be issued.");
	let value = api_client(&server)
		.get("/api/v1/risk", &[], &token)
		.await
		.expect("Risk lookup should succeed.");

	assert_eq!(value, json!({ "risk": 0 }));

	token_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_success_status_fails_with_exit_status_one() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path(SANCTION_PATH);
			then.status(500).body("upstream exploded");
		})
		.await;
	let result = api_client(&server).sanction(&SanctionQuery::default(), &bearer("token")).await;

	assert_eq!(cli::exit_status(&result), 1);

	let err = result.expect_err("Server error should fail the call.");

	assert!(
		matches!(&err, Error::Api { status: 500, body } if body == "upstream exploded"),
		"unexpected error: {err:?}"
	);
	assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn malformed_body_reports_parse_error() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/risk");
			then.status(200).header("content-type", "application/json").body("{\"risk\":");
		})
		.await;
	let err = api_client(&server)
		.get("/api/v1/risk", &[("chain".into(), "bitcoin_mainnet".into())], &bearer("token"))
		.await
		.expect_err("Truncated JSON should fail.");

	assert!(matches!(err, Error::ApiResponse { .. }), "unexpected error: {err:?}");
}
