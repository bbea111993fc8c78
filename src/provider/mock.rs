//! Deterministic stand-in for call sites that must not touch the network.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use crate::{
	_prelude::*,
	endpoint::Endpoint,
	obs::{self, ProviderKind},
	provider::{AuthFuture, AuthProvider},
};

const KIND: ProviderKind = ProviderKind::Mock;

/// Storage URL returned by [`MockAuthProvider::default`].
pub const MOCK_STORAGE_URL: &str = "http://localhost/v1/account";
/// Token returned by [`MockAuthProvider::default`].
pub const MOCK_TOKEN: &str = "xxxxxxxxx";

#[derive(Clone, Debug)]
enum Outcome {
	Endpoint(Endpoint),
	Rejected(String),
}

/// Provider that resolves to a fixed outcome and counts how often it was asked.
#[derive(Debug)]
pub struct MockAuthProvider {
	outcome: Outcome,
	calls: AtomicUsize,
}
impl MockAuthProvider {
	/// Always succeeds with `endpoint`.
	pub fn with_endpoint(endpoint: Endpoint) -> Self {
		Self { outcome: Outcome::Endpoint(endpoint), calls: AtomicUsize::new(0) }
	}

	/// Always fails with [`Error::CredentialsRejected`] carrying `reason`.
	pub fn rejecting(reason: impl Into<String>) -> Self {
		Self { outcome: Outcome::Rejected(reason.into()), calls: AtomicUsize::new(0) }
	}

	/// Number of completed `authenticate()` calls.
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn resolve(&self) -> Result<Endpoint> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		match &self.outcome {
			Outcome::Endpoint(endpoint) => Ok(endpoint.clone()),
			Outcome::Rejected(reason) => Err(Error::rejected(reason.clone())),
		}
	}
}
impl Default for MockAuthProvider {
	fn default() -> Self {
		Self::with_endpoint(Endpoint::fixed(MOCK_STORAGE_URL, MOCK_TOKEN))
	}
}
impl AuthProvider for MockAuthProvider {
	fn kind(&self) -> ProviderKind {
		KIND
	}

	fn authenticate(&self) -> AuthFuture<'_> {
		Box::pin(obs::observe(KIND, async move { self.resolve() }))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn default_fixture_is_stable() {
		let provider = MockAuthProvider::default();
		let first = provider.authenticate().await.expect("Mock should authenticate.");
		let second = provider.authenticate().await.expect("Mock should authenticate.");

		assert_eq!(first, second);
		assert_eq!(first.storage_url(), MOCK_STORAGE_URL);
		assert_eq!(first.cdn_url(), None);
		assert_eq!(first.token().expose(), MOCK_TOKEN);
		assert_eq!(provider.calls(), 2);
	}

	#[tokio::test]
	async fn custom_endpoint_passes_through_validation() {
		let endpoint = Endpoint::new(
			"https://storage.example.com/v1/AUTH_x",
			Some("https://cdn.example.com/v1/AUTH_x".into()),
			"tk-1",
		)
		.expect("Endpoint fixture should be valid.");
		let provider = MockAuthProvider::with_endpoint(endpoint.clone());
		let resolved = provider.authenticate().await.expect("Mock should authenticate.");

		assert_eq!(resolved, endpoint);
		assert_eq!(resolved.cdn_url(), Some("https://cdn.example.com/v1/AUTH_x"));
		assert_eq!(resolved.token().expose(), "tk-1");
	}

	#[tokio::test]
	async fn rejecting_mock_fails_every_call() {
		let provider = MockAuthProvider::rejecting("account disabled");
		let err = provider.authenticate().await.expect_err("Mock should reject.");

		assert!(matches!(
			err,
			Error::CredentialsRejected { ref reason } if reason == "account disabled"
		));
		assert_eq!(provider.calls(), 1);
	}
}
