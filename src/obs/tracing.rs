// self
use crate::{
	_prelude::*,
	obs::{CacheEvent, FlowKind},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by client flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("sanction_client.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a token-cache decision; failures carry the underlying error.
pub fn log_cache_event(event: CacheEvent, error: Option<&dyn Display>) {
	#[cfg(feature = "tracing")]
	{
		let detail = error.map(ToString::to_string).unwrap_or_default();

		match event {
			CacheEvent::Hit => tracing::debug!(event = event.as_str(), "token served from cache"),
			CacheEvent::Miss => tracing::debug!(event = event.as_str(), "no usable cached token"),
			CacheEvent::Write => tracing::debug!(event = event.as_str(), "token written to cache"),
			CacheEvent::ReadError => tracing::warn!(
				event = event.as_str(),
				error = %detail,
				"token cache unreadable; fetching a new token"
			),
			CacheEvent::WriteError => tracing::warn!(
				event = event.as_str(),
				error = %detail,
				"failed to write token cache"
			),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, error);
	}
}

/// Logs a successful token-endpoint exchange without exposing the token.
pub fn log_token_fetched(expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%expires_at, "token fetched from server");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = expires_at;
	}
}
