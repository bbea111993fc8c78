//! Optional observability helpers for authentication providers.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `cloudfiles_auth.provider` with the
//!   `provider` and `stage` fields, plus a `WARN` event for every failed authentication.
//! - Enable `metrics` to increment the `cloudfiles_auth_attempt_total` counter for every
//!   attempt/success/failure, labeled by `provider` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Authentication strategies observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
	/// Single-request header exchange.
	SimpleHeader,
	/// OAuth authorization-code flow with form scraping.
	OAuthBrowser,
	/// JSON-RPC session negotiation.
	LegacySession,
	/// Deterministic stub.
	Mock,
}
impl ProviderKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProviderKind::SimpleHeader => "simple_header",
			ProviderKind::OAuthBrowser => "oauth_browser",
			ProviderKind::LegacySession => "legacy_session",
			ProviderKind::Mock => "mock",
		}
	}
}
impl Display for ProviderKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOutcome {
	/// Entry to `authenticate()`.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl AuthOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthOutcome::Attempt => "attempt",
			AuthOutcome::Success => "success",
			AuthOutcome::Failure => "failure",
		}
	}
}
impl Display for AuthOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs a provider's protocol inside its span and records the attempt + outcome.
pub async fn observe<T, Fut>(kind: ProviderKind, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = AuthSpan::new(kind, "authenticate");

	record_auth_outcome(kind, AuthOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_auth_outcome(kind, AuthOutcome::Success),
		Err(err) => {
			record_failure(kind, err);
			record_auth_outcome(kind, AuthOutcome::Failure);
		},
	}

	result
}
