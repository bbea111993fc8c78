//! Authenticates against a local header-exchange service through the selector-driven factory,
//! then shows the same call surface for the network-free `mock` selector.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use cloudfiles_auth::{
	config::ProviderConfig,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{AuthProvider, ReqwestAuthContext, build_provider, reqwest_provider},
	reqwest::{Client, redirect::Policy},
};

// Trusts the self-signed certificate the local mock serves; never do this against a real service.
fn demo_context(config: ProviderConfig) -> Result<ReqwestAuthContext> {
	let client = Client::builder()
		.redirect(Policy::none())
		.pool_max_idle_per_host(0)
		.danger_accept_invalid_certs(true)
		.build()?;

	Ok(ReqwestAuthContext::with_http_client(
		config,
		ReqwestHttpClient::with_client(client),
		ReqwestTransportErrorMapper,
	))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let auth_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1.0")
				.header("x-auth-user", "demo-user")
				.header("x-auth-key", "demo-api-key");
			then.status(204)
				.header("x-storage-url", "https://storage.example.com/v1/AUTH_demo")
				.header("x-cdn-management-url", "https://cdn.example.com/v1/AUTH_demo")
				.header("x-auth-token", "demo-session-token");
		})
		.await;
	let config =
		ProviderConfig::new("demo-user", "demo-api-key").with_auth_url(server.url("/v1.0"));
	let provider = build_provider(demo_context(config)?)?;
	let endpoint = provider.authenticate().await?;

	auth_mock.assert_async().await;

	println!("{} provider resolved {endpoint:?}.", provider.kind());
	println!("Storage requests go to {}.", endpoint.storage_url());

	let rejecting = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1.0").header("x-auth-key", "wrong-key");
			then.status(401);
		})
		.await;
	let config = ProviderConfig::new("demo-user", "wrong-key").with_auth_url(server.url("/v1.0"));

	match build_provider(demo_context(config)?)?.authenticate().await {
		Ok(_) => println!("The service unexpectedly accepted a wrong key."),
		Err(e) => println!("Wrong key classified as {}: {e}.", e.kind()),
	}

	rejecting.assert_async().await;

	let mock = reqwest_provider(ProviderConfig::new("anyone", "anything").with_auth_url("mock"))?;
	let endpoint = mock.authenticate().await?;

	println!(
		"{} provider resolved {} without touching the network.",
		mock.kind(),
		endpoint.storage_url()
	);

	Ok(())
}
