//! Optional observability helpers for the token flow and API calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `sanction_client.flow` with the `flow` and `stage`
//!   fields, plus `debug` events for every token-cache decision.
//! - Enable `metrics` to increment `sanction_client_flow_total` (labeled by `flow` + `outcome`)
//!   and `sanction_client_token_cache_total` (labeled by `event`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Client Credentials token acquisition.
	ClientCredentials,
	/// Bearer-authenticated API request.
	ApiCall,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::ApiCall => "api_call",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token-cache decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// A fresh token was served from the cache.
	Hit,
	/// No usable token was cached.
	Miss,
	/// A freshly fetched token was stored.
	Write,
	/// The cache could not be read; treated as a miss.
	ReadError,
	/// The cache could not be written; the fetched token is still returned.
	WriteError,
}
impl CacheEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Miss => "miss",
			CacheEvent::Write => "write",
			CacheEvent::ReadError => "read_error",
			CacheEvent::WriteError => "write_error",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
