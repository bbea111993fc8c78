// self
use crate::obs::{AuthOutcome, ProviderKind};

/// Records an authentication outcome via the global metrics recorder (when enabled).
pub fn record_auth_outcome(kind: ProviderKind, outcome: AuthOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"cloudfiles_auth_attempt_total",
			"provider" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
