//! Client-credentials exchange through the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{
		ClientAuthMethod, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

type TokenClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// `oauth2` client bound to the descriptor's token endpoint and the shared transport.
pub(crate) struct TokenFacade {
	oauth_client: TokenClient,
	http_client: Arc<ReqwestHttpClient>,
}
impl TokenFacade {
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		http_client: Arc<ReqwestHttpClient>,
	) -> Self {
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(TokenUrl::from_url(descriptor.endpoints.token.clone()));

		if matches!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Self { oauth_client, http_client }
	}

	/// Runs the grant and builds a record whose expiry is the token's `exp` claim.
	pub(crate) async fn exchange_client_credentials(
		&self,
		strategy: &dyn ProviderStrategy,
		extra_params: &[(String, String)],
	) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_client_credentials();

		for (key, value) in extra_params {
			request = request.add_extra_param(key.as_str(), value.as_str());
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(strategy, meta.take(), err))?;

		map_token_response(response, OffsetDateTime::now_utc())
	}
}

/// Prefers the JWT `exp` claim; opaque tokens fall back to `expires_in`.
fn map_token_response(response: BasicTokenResponse, now: OffsetDateTime) -> Result<TokenRecord> {
	let access_token = response.access_token().secret().to_owned();

	match TokenRecord::from_jwt(access_token.clone()) {
		Ok(record) => Ok(record),
		Err(decode_error) => {
			let expires_in = response.expires_in().ok_or_else(|| {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %decode_error, "access token carries no usable expiry");
				#[cfg(not(feature = "tracing"))]
				let _ = &decode_error;

				ConfigError::MissingExpiry
			})?;
			let expires_in = i64::try_from(expires_in.as_secs())
				.map_err(|_| ConfigError::ExpiresInOutOfRange)?;

			if expires_in <= 0 {
				return Err(ConfigError::NonPositiveExpiresIn.into());
			}

			TokenRecord::builder()
				.access_token(access_token)
				.issued_at(now)
				.expires_in(Duration::seconds(expires_in))
				.build()
				.map_err(|err| ConfigError::from(err).into())
		},
	}
}

fn map_request_error(
	strategy: &dyn ProviderStrategy,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, response, meta_ref),
		RequestTokenError::Request(error) => map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new().with_oauth_error(response.error().as_ref());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = match response.error_description() {
		Some(description) => format!("{} ({description})", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_transport_error(meta: Option<&ResponseMetadata>, err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use time::macros;
	// self
	use super::*;
	use crate::auth::TokenRecordBuilderError;

	fn response(body: &str) -> BasicTokenResponse {
		serde_json::from_str(body).expect("Fixture token response should parse.")
	}

	#[test]
	fn jwt_expiry_takes_precedence_over_expires_in() {
		let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1767225600}"#);
		let body = format!(
			r#"{{"access_token":"e30.{payload}.sig","token_type":"Bearer","expires_in":60}}"#
		);
		let record = map_token_response(response(&body), macros::datetime!(2025-06-01 00:00 UTC))
			.expect("JWT token response should map.");

		assert_eq!(record.expires_at, macros::datetime!(2026-01-01 00:00 UTC));
	}

	#[test]
	fn opaque_tokens_fall_back_to_expires_in() {
		let now = macros::datetime!(2025-06-01 00:00 UTC);
		let record = map_token_response(
			response(r#"{"access_token":"opaque","token_type":"bearer","expires_in":900}"#),
			now,
		)
		.expect("Opaque token with expires_in should map.");

		assert_eq!(record.expires_at, now + Duration::seconds(900));

		let err = map_token_response(
			response(r#"{"access_token":"opaque","token_type":"bearer"}"#),
			now,
		)
		.expect_err("Opaque token without expires_in should fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingExpiry)));
	}

	#[test]
	fn rejects_zero_and_unrepresentable_expires_in() {
		let now = macros::datetime!(2025-06-01 00:00 UTC);
		let err = map_token_response(
			response(r#"{"access_token":"opaque","token_type":"bearer","expires_in":0}"#),
			now,
		)
		.expect_err("Zero expires_in should fail.");

		assert!(matches!(err, Error::Config(ConfigError::NonPositiveExpiresIn)));

		let err = map_token_response(
			response(
				r#"{"access_token":"opaque","token_type":"bearer","expires_in":1000000000000}"#,
			),
			now,
		)
		.expect_err("Expiry past the representable range should fail.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::TokenBuild(TokenRecordBuilderError::ExpiryOutOfRange))
		));
	}

	#[test]
	fn facade_builds_for_both_auth_methods() {
		let http_client = Arc::new(ReqwestHttpClient::with_client(ReqwestClient::new()));

		for method in [ClientAuthMethod::ClientSecretPost, ClientAuthMethod::ClientSecretBasic] {
			let descriptor = ProviderDescriptor::builder()
				.client_auth_method(method)
				.build()
				.expect("Descriptor should build.");
			let _ = TokenFacade::from_descriptor(&descriptor, "id", "secret", http_client.clone());
		}
	}
}
