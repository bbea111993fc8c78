// self
use crate::{_prelude::*, obs::ProviderKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAuth<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAuth<F> = F;

/// A span builder used by providers and their protocol stages.
#[derive(Clone, Debug)]
pub struct AuthSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AuthSpan {
	/// Creates a new span tagged with the provided kind + stage.
	pub fn new(kind: ProviderKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("cloudfiles_auth.provider", provider = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAuth<Fut>
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

	/// Runs a synchronous stage inside the span.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}
}

/// Emits a `WARN` event describing a failed authentication (when enabled).
///
/// Only the error's display form is logged; it never contains secrets.
pub fn record_failure(kind: ProviderKind, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			provider = kind.as_str(),
			error_kind = err.kind().as_str(),
			error = %err,
			"authentication failed"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, err);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = AuthSpan::new(ProviderKind::OAuthBrowser, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn record_failure_accepts_every_kind() {
		record_failure(ProviderKind::LegacySession, &Error::rejected("invalid password"));
	}
}
