//! Unverified JWT claim decoding.
//!
//! The token endpoint issues compact JWS access tokens. The cache only needs the `exp` claim
//! to decide whether a stored token is still usable, so the payload segment is decoded without
//! checking the signature. Never use these claims for authorization decisions.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Number;
// self
use crate::_prelude::*;

/// Errors raised while decoding an access token's claims.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenDecodeError {
	/// The token does not have the `header.payload.signature` shape.
	#[error("Token is not a compact JWT: expected 3 segments, found {found}.")]
	Segments {
		/// Number of `.`-separated segments found.
		found: usize,
	},
	/// The payload segment is not valid base64url.
	#[error("Token payload is not valid base64url: {message}.")]
	Base64 {
		/// Decoder message.
		message: String,
	},
	/// The payload segment is not a JSON object with the expected claim types.
	#[error("Token payload is not valid claims JSON: {message}.")]
	Json {
		/// Parser message including the offending claim path.
		message: String,
	},
	/// The payload has no numeric `exp` claim.
	#[error("Token payload has no numeric `exp` claim.")]
	MissingExp,
	/// The `exp` claim cannot be represented as a timestamp.
	#[error("Token `exp` claim {exp} is outside the supported range.")]
	ExpOutOfRange {
		/// Raw claim value in seconds.
		exp: i64,
	},
}

/// Registered claims the client cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JwtClaims {
	/// `exp` claim.
	pub expires_at: OffsetDateTime,
	/// `iat` claim, when present.
	pub issued_at: Option<OffsetDateTime>,
	/// `sub` claim, when present.
	pub subject: Option<String>,
	/// `aud` claim normalized into a list.
	pub audience: Vec<String>,
}
impl JwtClaims {
	/// Decodes the payload of `token` without verifying its signature.
	pub fn decode_unverified(token: &str) -> Result<Self, TokenDecodeError> {
		let segments = token.trim().split('.').collect::<Vec<_>>();

		if segments.len() != 3 {
			return Err(TokenDecodeError::Segments { found: segments.len() });
		}

		let payload = URL_SAFE_NO_PAD
			.decode(segments[1].trim_end_matches('='))
			.map_err(|e| TokenDecodeError::Base64 { message: e.to_string() })?;
		let de = &mut serde_json::Deserializer::from_slice(&payload);
		let raw: RawClaims = serde_path_to_error::deserialize(de)
			.map_err(|e| TokenDecodeError::Json { message: e.to_string() })?;
		let exp = raw.exp.as_ref().and_then(seconds).ok_or(TokenDecodeError::MissingExp)?;
		let expires_at = OffsetDateTime::from_unix_timestamp(exp)
			.map_err(|_| TokenDecodeError::ExpOutOfRange { exp })?;
		let issued_at = raw
			.iat
			.as_ref()
			.and_then(seconds)
			.and_then(|iat| OffsetDateTime::from_unix_timestamp(iat).ok());
		let audience = match raw.aud {
			Some(Audience::One(value)) => vec![value],
			Some(Audience::Many(values)) => values,
			None => Vec::new(),
		};

		Ok(Self { expires_at, issued_at, subject: raw.sub, audience })
	}
}

#[derive(Deserialize)]
struct RawClaims {
	#[serde(default)]
	exp: Option<Number>,
	#[serde(default)]
	iat: Option<Number>,
	#[serde(default)]
	sub: Option<String>,
	#[serde(default)]
	aud: Option<Audience>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Audience {
	One(String),
	Many(Vec<String>),
}

// NumericDate may be fractional; whole seconds are enough for expiry checks.
fn seconds(value: &Number) -> Option<i64> {
	value.as_i64().or_else(|| value.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
}
