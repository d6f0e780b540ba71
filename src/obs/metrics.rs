// self
use crate::obs::{CacheEvent, FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"sanction_client_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a token-cache decision via the global metrics recorder (when enabled).
pub fn record_cache_event(event: CacheEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("sanction_client_token_cache_total", "event" => event.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_installed_exporter() {
		record_flow_outcome(FlowKind::ApiCall, FlowOutcome::Failure);
		record_cache_event(CacheEvent::Miss);
	}
}
