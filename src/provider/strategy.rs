//! Provider strategy hooks that customize token exchanges.
//!
//! Implementations decorate outgoing token requests and normalize error mapping
//! without tying the flow to any particular HTTP client.

// self
use crate::{_prelude::*, provider::ProviderDescriptor};

/// Strategy hook that allows providers to decorate requests and classify errors.
///
/// Implementors are required to be `Send + Sync`, and the hooks use crate-owned data
/// types so strategies never depend on reqwest-specific structures.
pub trait ProviderStrategy: Send + Sync {
	/// Maps OAuth error responses into the crate taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Adds custom form parameters before the token request is dispatched.
	///
	/// The default implementation forwards the descriptor's audience, which the token
	/// endpoint requires to mint tokens for the screening API.
	fn augment_token_request(
		&self,
		descriptor: &ProviderDescriptor,
		form: &mut BTreeMap<String, String>,
	) {
		if let Some(audience) = descriptor.audience.as_ref() {
			form.insert("audience".into(), audience.clone());
		}
	}
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the grant.
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes or audience exceed what the client may obtain.
	InsufficientScope,
	/// Failure is temporary.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
}
impl ProviderErrorContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}
}

/// Default strategy that applies RFC-guided heuristics.
///
/// It prioritizes the structured OAuth `error` code, then hints found in
/// `error_description`, and finally the HTTP status code.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		ctx.oauth_error
			.as_deref()
			.and_then(match_exact_value)
			.or_else(|| ctx.error_description.as_deref().and_then(match_exact_value))
			.or_else(|| classify_text(ctx.error_description.as_deref()))
			.unwrap_or_else(|| classify_status(ctx.http_status))
	}
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	// There is no end user in this grant, so `access_denied` means the client itself was refused.
	if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
		|| value.eq_ignore_ascii_case("access_denied")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("unsupported_grant_type")
	{
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ProviderErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_text(text: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = text?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_client") || text.contains("unauthorized") =>
			Some(ProviderErrorKind::InvalidClient),
		text if text.contains("invalid_grant") => Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("scope") || text.contains("audience") =>
			Some(ProviderErrorKind::InsufficientScope),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		_ => ProviderErrorKind::Transient,
	}
}
