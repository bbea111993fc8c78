//! Identity material and per-provider settings supplied at construction time.

// self
use crate::{_prelude::*, secret::Secret};

/// Rackspace US authentication endpoint; the default target.
pub const US_AUTH_URL: &str = "https://auth.api.rackspacecloud.com/v1.0";
/// Rackspace UK authentication endpoint.
pub const UK_AUTH_URL: &str = "https://lon.auth.api.rackspacecloud.com/v1.0";

/// Identity and secret presented to the authentication service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// Username, login, or account e-mail.
	pub identity: String,
	/// API key or password.
	pub secret: Secret,
}
impl Credentials {
	/// Creates a new credential pair.
	pub fn new(identity: impl Into<String>, secret: impl Into<Secret>) -> Self {
		Self { identity: identity.into(), secret: secret.into() }
	}
}

/// Immutable provider configuration shared by every authentication strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
	/// Identity material.
	pub credentials: Credentials,
	/// Authentication endpoint or tagged provider selector (see
	/// [`ProviderSelector`](crate::provider::ProviderSelector)).
	pub auth_url: String,
	/// Upper bound applied to each individual network operation.
	pub timeout: StdDuration,
	/// `User-Agent` sent with every request.
	pub user_agent: String,
}
impl ProviderConfig {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(15);
	/// Default `User-Agent` value.
	pub const DEFAULT_USER_AGENT: &'static str =
		concat!("cloudfiles-auth/", env!("CARGO_PKG_VERSION"));

	/// Creates a configuration targeting [`US_AUTH_URL`] with default timeout + user agent.
	pub fn new(identity: impl Into<String>, secret: impl Into<Secret>) -> Self {
		Self {
			credentials: Credentials::new(identity, secret),
			auth_url: US_AUTH_URL.into(),
			timeout: Self::DEFAULT_TIMEOUT,
			user_agent: Self::DEFAULT_USER_AGENT.into(),
		}
	}

	/// Overrides the authentication endpoint or provider selector.
	pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
		self.auth_url = auth_url.into();

		self
	}

	/// Overrides the per-request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the `User-Agent` header value.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_target_us_endpoint() {
		let config = ProviderConfig::new("jdoe", "api-key");

		assert_eq!(config.auth_url, US_AUTH_URL);
		assert_eq!(config.timeout, StdDuration::from_secs(15));
		assert!(config.user_agent.starts_with("cloudfiles-auth/"));
		assert!(!format!("{config:?}").contains("api-key"));
	}

	#[test]
	fn builders_override_fields() {
		let config = ProviderConfig::new("jdoe", "api-key")
			.with_auth_url(UK_AUTH_URL)
			.with_timeout(StdDuration::from_secs(3))
			.with_user_agent("storage-sync/2.1");

		assert_eq!(config.auth_url, UK_AUTH_URL);
		assert_eq!(config.timeout, StdDuration::from_secs(3));
		assert_eq!(config.user_agent, "storage-sync/2.1");
	}
}
