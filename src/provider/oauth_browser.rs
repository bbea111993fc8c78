//! OAuth authorization-code flow driven without a browser (hubiC-style).
//!
//! The flow walks five strictly sequential stages, each in its own span:
//!
//! 1. `authorize`: GET `{oauth_base}auth/` and receive the HTML login page.
//! 2. `extract_form_token`: scrape the hidden `oauth` input from that page.
//! 3. `login`: POST the login form and capture the `code` from the `302` redirect.
//! 4. `exchange_code`: trade the code for a bearer access token at `{oauth_base}token/`.
//! 5. `fetch_credentials`: GET `{api_base}account/credentials/` with the bearer token.
//!
//! The first failure is terminal.

pub mod form;

pub use form::*;

// crates.io
use oauth2::{
	RedirectUrl,
	http::{
		Method, StatusCode,
		header::{AUTHORIZATION, LOCATION},
	},
};
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth_url::ParsedUrl,
	endpoint::Endpoint,
	error::ConfigError,
	http::AuthHttpClient,
	oauth::{self, CodeExchange, TransportErrorMapper},
	obs::{self, AuthSpan, ProviderKind},
	provider::{
		AuthFuture, AuthProvider,
		context::{self, AuthContext, Reply},
	},
	secret::Secret,
};
#[cfg(feature = "reqwest")]
use crate::{config::ProviderConfig, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const KIND: ProviderKind = ProviderKind::OAuthBrowser;
const STATE_LEN: usize = 32;

/// Scope requested from the authorization endpoint.
pub const REQUESTED_SCOPE: &str = "credentials.r,account.r";
/// Name of the hidden login-form field carrying the CSRF-style token.
pub const FORM_TOKEN_FIELD: &str = "oauth";

#[cfg(feature = "reqwest")]
/// OAuth flow over the default reqwest transport.
pub type ReqwestOAuthBrowserAuth = OAuthBrowserAuth<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Registered OAuth application: client id, client secret, redirect URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthClientConfig {
	/// Application identifier issued by the service.
	pub client_id: String,
	/// Application secret issued by the service.
	pub client_secret: Secret,
	/// Redirect URI registered for the application.
	pub redirect_uri: String,
}
impl OAuthClientConfig {
	/// Creates a client configuration; the redirect URI must be an absolute URL.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		redirect_uri: impl Into<String>,
	) -> Result<Self> {
		let client_id = client_id.into();
		let redirect_uri = redirect_uri.into();

		if client_id.is_empty() {
			return Err(
				ConfigError::InvalidSelector { reason: "OAuth client id is empty".into() }.into()
			);
		}

		RedirectUrl::new(redirect_uri.clone())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;

		Ok(Self { client_id, client_secret: client_secret.into(), redirect_uri })
	}
}
impl FromStr for OAuthClientConfig {
	type Err = Error;

	/// Parses the historical `client_id|client_secret|redirect_uri` encoding.
	fn from_str(s: &str) -> Result<Self> {
		let mut fields = s.splitn(3, '|');

		match (fields.next(), fields.next(), fields.next()) {
			(Some(id), Some(secret), Some(redirect)) => Self::new(id, secret, redirect),
			_ => Err(ConfigError::InvalidSelector {
				reason: "expected `client_id|client_secret|redirect_uri`".into(),
			}
			.into()),
		}
	}
}

/// Base URLs of the OAuth server and the account API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthEndpoints {
	/// Base of the `auth/` and `token/` endpoints.
	pub oauth_base: String,
	/// Base of the `account/credentials/` resource.
	pub api_base: String,
}
impl OAuthEndpoints {
	/// Production hubiC OAuth base.
	pub const HUBIC_OAUTH_BASE: &'static str = "https://api.hubic.com/oauth/";
	/// Production hubiC API base.
	pub const HUBIC_API_BASE: &'static str = "https://api.hubic.com/1.0/";

	/// Creates a custom endpoint pair.
	pub fn new(oauth_base: impl Into<String>, api_base: impl Into<String>) -> Self {
		Self { oauth_base: oauth_base.into(), api_base: api_base.into() }
	}

	fn resolve(&self) -> Result<ResolvedEndpoints> {
		Ok(ResolvedEndpoints {
			authorize: join(&self.oauth_base, "auth/")?,
			token: join(&self.oauth_base, "token/")?,
			credentials: join(&self.api_base, "account/credentials/")?,
		})
	}
}
impl Default for OAuthEndpoints {
	fn default() -> Self {
		Self::new(Self::HUBIC_OAUTH_BASE, Self::HUBIC_API_BASE)
	}
}

#[derive(Clone, Debug)]
struct ResolvedEndpoints {
	authorize: Url,
	token: Url,
	credentials: Url,
}

#[derive(Deserialize)]
struct AccountCredentials {
	endpoint: String,
	token: String,
}

/// Provider running the browserless OAuth authorization-code flow.
///
/// Failure mapping per stage:
///
/// - `authorize`: any status other than 200 is [`Error::CredentialsRejected`].
/// - `extract_form_token`: a page without the `oauth` input is [`Error::MalformedResponse`].
/// - `login`: anything but a `302` into the redirect URI carrying a `code` is
///   [`Error::CredentialsRejected`].
/// - `exchange_code`: non-200 is [`Error::CredentialsRejected`]; an unparsable body or a token
///   type other than bearer (compared case-insensitively) is [`Error::MalformedResponse`].
/// - `fetch_credentials`: 401 is [`Error::CredentialsRejected`], other non-2xx statuses are
///   [`Error::NonSuccessStatus`], missing fields are [`Error::MalformedResponse`].
pub struct OAuthBrowserAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	context: AuthContext<C, M>,
	client: OAuthClientConfig,
	endpoints: OAuthEndpoints,
	resolved: ResolvedEndpoints,
	exchange: CodeExchange,
	extractor: Arc<dyn FormFieldExtractor>,
}
impl<C, M> OAuthBrowserAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider against the production hubiC endpoints.
	pub fn new(context: AuthContext<C, M>, client: OAuthClientConfig) -> Result<Self> {
		Self::with_endpoints(context, client, OAuthEndpoints::default())
	}

	/// Creates a provider against custom endpoints.
	pub fn with_endpoints(
		context: AuthContext<C, M>,
		client: OAuthClientConfig,
		endpoints: OAuthEndpoints,
	) -> Result<Self> {
		let resolved = endpoints.resolve()?;
		let exchange = CodeExchange::new(
			&resolved.token,
			&client.client_id,
			&client.client_secret,
			&client.redirect_uri,
		)?;

		Ok(Self {
			context,
			client,
			endpoints,
			resolved,
			exchange,
			extractor: Arc::new(FieldExtractorChain::default()),
		})
	}

	/// Replaces the login-page field extractor.
	pub fn with_field_extractor(mut self, extractor: impl 'static + FormFieldExtractor) -> Self {
		self.extractor = Arc::new(extractor);

		self
	}

	/// Registered client used by the flow.
	pub fn client(&self) -> &OAuthClientConfig {
		&self.client
	}

	/// Endpoints the flow talks to.
	pub fn endpoints(&self) -> &OAuthEndpoints {
		&self.endpoints
	}

	async fn run(&self) -> Result<Endpoint> {
		let state = generate_state();
		let page = AuthSpan::new(KIND, "authorize").instrument(self.authorize(&state)).await?;
		let form_token =
			AuthSpan::new(KIND, "extract_form_token").in_scope(|| self.extract_form_token(&page))?;
		let code =
			AuthSpan::new(KIND, "login").instrument(self.login(&form_token, &state)).await?;
		let access_token = AuthSpan::new(KIND, "exchange_code")
			.instrument(self.exchange.exchange(
				&*self.context.http_client,
				&*self.context.transport_mapper,
				self.context.config.timeout,
				&self.context.config.user_agent,
				&code,
			))
			.await?;

		AuthSpan::new(KIND, "fetch_credentials")
			.instrument(self.fetch_credentials(&access_token))
			.await
	}

	async fn authorize(&self, state: &str) -> Result<String> {
		let mut url = self.resolved.authorize.clone();

		url.query_pairs_mut()
			.append_pair("client_id", &self.client.client_id)
			.append_pair("redirect_uri", &self.client.redirect_uri)
			.append_pair("scope", REQUESTED_SCOPE)
			.append_pair("response_type", "code")
			.append_pair("state", state);

		let request = context::finish(self.context.request(Method::GET, &url), Vec::new())?;
		let reply = self.context.send(KIND, request).await?;

		if reply.status() != StatusCode::OK {
			let detail = redirect_error(&reply)
				.or_else(|| oauth::body_preview(reply.body()))
				.unwrap_or_else(|| format!("status {}", reply.status().as_u16()));

			return Err(Error::rejected(format!(
				"incorrect or unauthorized client_id `{}` ({detail})",
				self.client.client_id
			)));
		}

		Ok(String::from_utf8_lossy(reply.body()).into_owned())
	}

	fn extract_form_token(&self, page: &str) -> Result<String> {
		self.extractor
			.extract(page, FORM_TOKEN_FIELD)
			.map(|value| value.trim().to_owned())
			.filter(|value| !value.is_empty())
			.ok_or_else(|| {
				Error::malformed(format!(
					"authorization page has no `{FORM_TOKEN_FIELD}` form field"
				))
			})
	}

	async fn login(&self, form_token: &str, state: &str) -> Result<String> {
		let credentials = &self.context.config.credentials;
		let request = context::finish_form(
			self.context.request(Method::POST, &self.resolved.authorize),
			[
				("action", "accepted"),
				(FORM_TOKEN_FIELD, form_token),
				("login", credentials.identity.as_str()),
				("user_pwd", credentials.secret.expose()),
				("account", "r"),
				("credentials", "r"),
			],
		)?;
		let reply = self.context.send(KIND, request).await?;
		let location = reply
			.header(LOCATION.as_str())
			.filter(|_| reply.status() == StatusCode::FOUND)
			.filter(|location| location.starts_with(&self.client.redirect_uri))
			.ok_or_else(|| {
				Error::rejected("unable to authorize client_id, invalid login or password")
			})?;
		let location = Url::parse(location)
			.map_err(|_| Error::rejected("authorization redirect is not a valid URL"))?;
		let query = location.query_pairs().collect::<HashMap<_, _>>();

		if let Some(error) = query.get("error") {
			return Err(Error::rejected(match query.get("error_description") {
				Some(description) => format!("{error}: {description}"),
				None => error.to_string(),
			}));
		}
		if query.get("state").is_some_and(|returned| returned.as_ref() != state) {
			return Err(Error::rejected("authorization redirect carries a foreign `state`"));
		}

		query
			.get("code")
			.filter(|code| !code.is_empty())
			.map(|code| code.to_string())
			.ok_or_else(|| Error::rejected("authorization redirect carries no `code`"))
	}

	async fn fetch_credentials(&self, access_token: &Secret) -> Result<Endpoint> {
		let request = context::finish(
			self.context
				.request(Method::GET, &self.resolved.credentials)
				.header(AUTHORIZATION, format!("Bearer {}", access_token.expose())),
			Vec::new(),
		)?;
		let reply = self.context.send(KIND, request).await?;
		let status = reply.status();

		if status == StatusCode::UNAUTHORIZED {
			return Err(Error::rejected("access token was refused by the account API"));
		}
		if !status.is_success() {
			return Err(reply.non_success());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(reply.body());
		let credentials: AccountCredentials =
			serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
				Error::malformed(format!("account credentials are invalid at `{}`", e.path()))
			})?;

		Endpoint::new(credentials.endpoint, None, credentials.token)
	}
}
#[cfg(feature = "reqwest")]
impl OAuthBrowserAuth<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a provider over a freshly built reqwest transport.
	pub fn from_config(config: ProviderConfig, client: OAuthClientConfig) -> Result<Self> {
		Self::new(AuthContext::new(config)?, client)
	}
}
impl<C, M> AuthProvider for OAuthBrowserAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn kind(&self) -> ProviderKind {
		KIND
	}

	fn authenticate(&self) -> AuthFuture<'_> {
		Box::pin(obs::observe(KIND, self.run()))
	}
}
impl<C, M> Debug for OAuthBrowserAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthBrowserAuth")
			.field("context", &self.context)
			.field("client", &self.client)
			.field("endpoints", &self.endpoints)
			.finish()
	}
}

fn generate_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

fn join(base: &str, segment: &str) -> Result<Url> {
	let base = if base.ends_with('/') { base.to_owned() } else { format!("{base}/") };
	let parsed = ParsedUrl::parse(&base)?;

	parsed
		.as_url()
		.join(segment)
		.map_err(|e| ConfigError::invalid_url(&base, e.to_string()).into())
}

/// `error`/`error_description` carried by a `Location` header, if any.
fn redirect_error(reply: &Reply) -> Option<String> {
	let location = Url::parse(reply.header(LOCATION.as_str())?).ok()?;
	let query = location.query_pairs().collect::<HashMap<_, _>>();
	let error = query.get("error")?;

	Some(match query.get("error_description") {
		Some(description) => format!("{error}: {description}"),
		None => error.to_string(),
	})
}
