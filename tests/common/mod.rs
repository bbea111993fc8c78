//! Helpers shared by the reqwest-backed integration suites.

#![allow(dead_code)]

// std
use std::time::Duration;
// self
use cloudfiles_auth::{
	config::ProviderConfig,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::ReqwestAuthContext,
	reqwest::{Client, redirect::Policy},
};

pub const IDENTITY: &str = "jdoe@example.com";
pub const SECRET: &str = "api-key-123";

/// Configuration with a short timeout so a hung mock fails the test quickly.
pub fn test_config(auth_url: impl Into<String>) -> ProviderConfig {
	ProviderConfig::new(IDENTITY, SECRET)
		.with_auth_url(auth_url)
		.with_timeout(Duration::from_secs(5))
}

/// Reqwest transport shaped like the default one that also trusts the self-signed certificate
/// `httpmock` serves over https.
pub fn test_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.redirect(Policy::none())
		.pool_max_idle_per_host(0)
		.danger_accept_invalid_certs(true)
		.build()
		.expect("Failed to build reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Context over [`test_http_client`] (redirects disabled).
pub fn test_context(config: ProviderConfig) -> ReqwestAuthContext {
	ReqwestAuthContext::with_http_client(config, test_http_client(), ReqwestTransportErrorMapper)
}
