//! Chooses a provider from the configured endpoint string.
//!
//! - `hubic|<client_id>|<client_secret>|<redirect_uri>` selects [`OAuthBrowserAuth`].
//! - `hubic-legacy`, optionally followed by `|<dispatcher base>`, selects
//!   [`LegacySessionAuth`].
//! - `mock` selects [`MockAuthProvider`].
//! - Any `http`/`https` URL selects [`SimpleHeaderAuth`].

// self
use crate::{
	_prelude::*,
	auth_url::ParsedUrl,
	error::ConfigError,
	http::AuthHttpClient,
	oauth::TransportErrorMapper,
	obs::ProviderKind,
	provider::{
		AuthContext, AuthProvider, LegacyEndpoints, LegacySessionAuth, MockAuthProvider,
		OAuthBrowserAuth, OAuthClientConfig, SimpleHeaderAuth,
	},
};
#[cfg(feature = "reqwest")] use crate::config::ProviderConfig;

/// Tag selecting the OAuth flow.
pub const OAUTH_TAG: &str = "hubic";
/// Tag selecting the dispatcher session flow.
pub const LEGACY_TAG: &str = "hubic-legacy";
/// Selector for the network-free stub.
pub const MOCK_TAG: &str = "mock";

/// Provider variant decoded from an endpoint string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderSelector {
	/// Header exchange against the parsed URL.
	SimpleHeader(ParsedUrl),
	/// OAuth flow for the registered client.
	OAuthBrowser(OAuthClientConfig),
	/// Dispatcher session flow.
	LegacySession(LegacyEndpoints),
	/// Deterministic stub.
	Mock,
}
impl ProviderSelector {
	/// Decodes `auth_url`.
	pub fn parse(auth_url: &str) -> Result<Self> {
		let auth_url = auth_url.trim();
		let (tag, rest) = match auth_url.split_once('|') {
			Some((tag, rest)) => (tag, Some(rest)),
			None => (auth_url, None),
		};

		match (tag, rest) {
			(OAUTH_TAG, Some(rest)) => Ok(Self::OAuthBrowser(rest.parse()?)),
			(OAUTH_TAG, None) => Err(ConfigError::InvalidSelector {
				reason: format!(
					"`{OAUTH_TAG}` needs three `|`-separated fields: client_id, client_secret, \
					 redirect_uri"
				),
			}
			.into()),
			(LEGACY_TAG, None) => Ok(Self::LegacySession(LegacyEndpoints::default())),
			(LEGACY_TAG, Some(base)) => Ok(Self::LegacySession(LegacyEndpoints::new(base.trim()))),
			(MOCK_TAG, None) => Ok(Self::Mock),
			_ => Ok(Self::SimpleHeader(ParsedUrl::parse(auth_url)?)),
		}
	}

	/// Kind of provider this selector builds.
	pub fn kind(&self) -> ProviderKind {
		match self {
			Self::SimpleHeader(_) => ProviderKind::SimpleHeader,
			Self::OAuthBrowser(_) => ProviderKind::OAuthBrowser,
			Self::LegacySession(_) => ProviderKind::LegacySession,
			Self::Mock => ProviderKind::Mock,
		}
	}

	/// Builds the selected provider over `context`.
	pub fn build<C, M>(self, context: AuthContext<C, M>) -> Result<Box<dyn AuthProvider>>
	where
		C: ?Sized + AuthHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		let provider: Box<dyn AuthProvider> = match self {
			Self::SimpleHeader(target) => Box::new(SimpleHeaderAuth::with_target(context, target)),
			Self::OAuthBrowser(client) => Box::new(OAuthBrowserAuth::new(context, client)?),
			Self::LegacySession(endpoints) =>
				Box::new(LegacySessionAuth::with_endpoints(context, endpoints)?),
			Self::Mock => Box::new(MockAuthProvider::default()),
		};

		Ok(provider)
	}
}
impl FromStr for ProviderSelector {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

/// Builds the provider selected by `context.config.auth_url`.
pub fn build_provider<C, M>(context: AuthContext<C, M>) -> Result<Box<dyn AuthProvider>>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	ProviderSelector::parse(&context.config.auth_url)?.build(context)
}

/// Builds the provider selected by `config.auth_url` over a fresh reqwest transport.
#[cfg(feature = "reqwest")]
pub fn reqwest_provider(config: ProviderConfig) -> Result<Box<dyn AuthProvider>> {
	build_provider(AuthContext::new(config)?)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn tags_select_providers() {
		let oauth = ProviderSelector::parse("hubic|api_hubic_1|s3cr3t|https://app.example.com/cb")
			.expect("OAuth selector should parse.");

		assert_eq!(oauth.kind(), ProviderKind::OAuthBrowser);

		let ProviderSelector::OAuthBrowser(client) = oauth else {
			panic!("OAuth selector should decode a client config.");
		};

		assert_eq!(client.client_id, "api_hubic_1");
		assert_eq!(client.redirect_uri, "https://app.example.com/cb");
		assert_eq!(
			ProviderSelector::parse("hubic-legacy").expect("Legacy selector should parse."),
			ProviderSelector::LegacySession(LegacyEndpoints::default())
		);
		assert_eq!(
			ProviderSelector::parse("hubic-legacy|http://127.0.0.1:9000/r5/")
				.expect("Legacy selector with base should parse."),
			ProviderSelector::LegacySession(LegacyEndpoints::new("http://127.0.0.1:9000/r5/"))
		);
		assert_eq!(
			ProviderSelector::parse("mock").expect("Mock selector should parse."),
			ProviderSelector::Mock
		);
	}

	#[test]
	fn plain_urls_select_the_header_exchange() {
		let selector = ProviderSelector::parse(crate::config::UK_AUTH_URL)
			.expect("Auth URL should parse.");

		assert_eq!(selector.kind(), ProviderKind::SimpleHeader);
	}

	#[test]
	fn incomplete_selectors_are_config_errors() {
		for raw in ["hubic", "hubic|only-id", "hubic|id|secret", "not a url"] {
			let err = ProviderSelector::parse(raw).expect_err("Incomplete selector must fail.");

			assert!(matches!(err, Error::Config(_)), "{raw}: {err:?}");
		}
	}
}
