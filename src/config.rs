//! Environment-driven configuration.
//!
//! ## Env Reads
//!
//! - `CLIENT_ID`, `CLIENT_SECRET` - OAuth client credentials (required).
//! - `CIPHEROWL_API_URL` - API base URL; the token endpoint is `<base>/oauth/token`.
//! - `CIPHEROWL_AUDIENCE` - audience requested for tokens.
//! - `CIPHEROWL_TOKEN_PATH` - location of the on-disk token cache.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{DEFAULT_API_URL, DEFAULT_AUDIENCE, ProviderDescriptor},
	store::FileStore,
};

/// Client ID variable.
pub const CLIENT_ID: &str = "CLIENT_ID";
/// Client secret variable.
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
/// API base URL override.
pub const API_URL: &str = "CIPHEROWL_API_URL";
/// Audience override.
pub const AUDIENCE: &str = "CIPHEROWL_AUDIENCE";
/// Token cache path override.
pub const TOKEN_PATH: &str = "CIPHEROWL_TOKEN_PATH";

/// Resolved client configuration.
#[derive(Clone)]
pub struct Config {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// API base URL.
	pub api_base: Url,
	/// Audience sent with token requests.
	pub audience: String,
	/// Explicit cache file location, if configured.
	pub token_path: Option<PathBuf>,
}
impl Config {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, treating blank values as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let client_id = read(CLIENT_ID).ok_or(ConfigError::MissingEnv { name: CLIENT_ID })?;
		let client_secret =
			read(CLIENT_SECRET).ok_or(ConfigError::MissingEnv { name: CLIENT_SECRET })?;
		let api_base = read(API_URL).unwrap_or_else(|| DEFAULT_API_URL.into());
		let api_base = Url::parse(&api_base)
			.map_err(|source| ConfigError::InvalidUrl { name: API_URL, source })?;
		let audience = read(AUDIENCE).unwrap_or_else(|| DEFAULT_AUDIENCE.into());
		let token_path = read(TOKEN_PATH).map(PathBuf::from);

		Ok(Self { client_id, client_secret, api_base, audience, token_path })
	}

	/// Builds the provider descriptor for this configuration.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		Ok(ProviderDescriptor::builder()
			.api_base(self.api_base.clone())
			.audience(self.audience.clone())
			.build()?)
	}

	/// Cache file location: the explicit path, or `~/.cipherowl/token-cache.json`.
	pub fn token_path(&self) -> Result<PathBuf, ConfigError> {
		match &self.token_path {
			Some(path) => Ok(path.clone()),
			None => FileStore::default_path(),
		}
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("api_base", &self.api_base.as_str())
			.field("audience", &self.audience)
			.field("token_path", &self.token_path)
			.finish()
	}
}
