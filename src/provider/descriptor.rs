//! Provider descriptor data structures, builder, and validation.

// self
use crate::_prelude::*;

/// Production API host.
pub const DEFAULT_API_URL: &str = "https://svc.cipherowl.ai";
/// Audience requested for production tokens.
pub const DEFAULT_AUDIENCE: &str = "svc.cipherowl.ai";
/// Token endpoint path relative to the API base.
pub const TOKEN_PATH: &str = "/oauth/token";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
}

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Endpoint URL could not be derived or parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at the local machine.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// An explicitly configured audience must not be blank.
	#[error("Audience must not be empty.")]
	EmptyAudience,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Token endpoint used for the client-credentials exchange.
	pub token: Url,
	/// Base URL that API paths are appended to.
	pub api_base: Url,
}

/// Immutable provider descriptor consumed by the token flow and the API client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions.
	pub endpoints: ProviderEndpoints,
	/// Audience sent with every token request.
	pub audience: Option<String>,
	/// Client authentication mechanism.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Creates a new builder seeded with production defaults.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::default()
	}

	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("API", &self.endpoints.api_base)?;

		if self.audience.as_deref().is_some_and(|audience| audience.trim().is_empty()) {
			return Err(ProviderDescriptorError::EmptyAudience);
		}

		Ok(())
	}
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	api_base: Option<Url>,
	token_endpoint: Option<Url>,
	audience: Option<String>,
	client_auth_method: ClientAuthMethod,
}
impl Default for ProviderDescriptorBuilder {
	fn default() -> Self {
		Self {
			api_base: None,
			token_endpoint: None,
			audience: Some(DEFAULT_AUDIENCE.into()),
			client_auth_method: ClientAuthMethod::default(),
		}
	}
}
impl ProviderDescriptorBuilder {
	/// Sets the API base URL; the token endpoint defaults to `<api_base>/oauth/token`.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the audience parameter.
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = Some(audience.into());

		self
	}

	/// Omits the audience parameter from token requests.
	pub fn without_audience(mut self) -> Self {
		self.audience = None;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let api_base = match self.api_base {
			Some(url) => url,
			None => Url::parse(DEFAULT_API_URL)
				.map_err(|source| ProviderDescriptorError::InvalidEndpoint { endpoint: "API", source })?,
		};
		let token = match self.token_endpoint {
			Some(url) => url,
			None => join_path(&api_base, TOKEN_PATH)
				.map_err(|source| ProviderDescriptorError::InvalidEndpoint { endpoint: "token", source })?,
		};
		let descriptor = ProviderDescriptor {
			endpoints: ProviderEndpoints { token, api_base },
			audience: self.audience,
			client_auth_method: self.client_auth_method,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

/// Appends `path` to `base`, keeping any path prefix `base` already carries.
pub fn join_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
	let base = base.as_str().trim_end_matches('/');
	let path = path.trim_start_matches('/');

	Url::parse(&format!("{base}/{path}"))
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
