//! Single-request header exchange (CloudFiles-style `x-auth-user` / `x-auth-key`).

// crates.io
use oauth2::http::{Method, StatusCode};
// self
use crate::{
	_prelude::*,
	auth_url::ParsedUrl,
	endpoint::Endpoint,
	http::AuthHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, ProviderKind},
	provider::{
		AuthFuture, AuthProvider,
		context::{self, AuthContext},
	},
};
#[cfg(feature = "reqwest")]
use crate::{config::ProviderConfig, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const KIND: ProviderKind = ProviderKind::SimpleHeader;

/// Request header carrying the identity.
pub const AUTH_USER_HEADER: &str = "x-auth-user";
/// Request header carrying the API key.
pub const AUTH_KEY_HEADER: &str = "x-auth-key";
/// Response header carrying the storage URL.
pub const STORAGE_URL_HEADER: &str = "x-storage-url";
/// Response header carrying the CDN management URL.
pub const CDN_MANAGEMENT_URL_HEADER: &str = "x-cdn-management-url";
/// Response headers that may carry the token, in order of preference.
pub const TOKEN_HEADERS: [&str; 2] = ["x-storage-token", "x-auth-token"];

#[cfg(feature = "reqwest")]
/// Header exchange over the default reqwest transport.
pub type ReqwestSimpleHeaderAuth = SimpleHeaderAuth<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Baseline provider: one `GET` with credential headers, result read from response headers.
///
/// | status                         | outcome                          |
/// |--------------------------------|----------------------------------|
/// | 401                            | [`Error::CredentialsRejected`]   |
/// | outside `[200, 300)`           | [`Error::NonSuccessStatus`]      |
/// | 2xx without storage URL/token  | [`Error::MalformedResponse`]     |
/// | 2xx with both                  | [`Endpoint`]                     |
pub struct SimpleHeaderAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	context: AuthContext<C, M>,
	target: ParsedUrl,
}
impl<C, M> SimpleHeaderAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider targeting `context.config.auth_url`.
	pub fn new(context: AuthContext<C, M>) -> Result<Self> {
		let target = ParsedUrl::parse(&context.config.auth_url)?;

		Ok(Self::with_target(context, target))
	}

	/// Creates a provider for an already parsed endpoint.
	pub fn with_target(context: AuthContext<C, M>, target: ParsedUrl) -> Self {
		Self { context, target }
	}

	/// Endpoint the provider authenticates against.
	pub fn target(&self) -> &ParsedUrl {
		&self.target
	}

	async fn run(&self) -> Result<Endpoint> {
		let credentials = &self.context.config.credentials;
		let request = context::finish(
			self.context
				.request(Method::GET, self.target.as_url())
				.header(AUTH_USER_HEADER, credentials.identity.as_str())
				.header(AUTH_KEY_HEADER, credentials.secret.expose()),
			Vec::new(),
		)?;
		let reply = self.context.send(KIND, request).await?;
		let status = reply.status();

		if status == StatusCode::UNAUTHORIZED {
			return Err(Error::rejected(format!(
				"`{}` was not accepted by the authentication service",
				credentials.identity
			)));
		}
		if !status.is_success() {
			return Err(reply.non_success());
		}

		let storage_url = reply
			.header(STORAGE_URL_HEADER)
			.ok_or_else(|| Error::malformed(format!("missing `{STORAGE_URL_HEADER}` header")))?;
		let token = TOKEN_HEADERS
			.iter()
			.find_map(|name| reply.header(name))
			.ok_or_else(|| Error::malformed("missing `x-storage-token`/`x-auth-token` header"))?;
		let cdn_url = reply.header(CDN_MANAGEMENT_URL_HEADER).map(str::to_owned);

		Endpoint::new(storage_url, cdn_url, token)
	}
}
#[cfg(feature = "reqwest")]
impl SimpleHeaderAuth<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a provider over a freshly built reqwest transport.
	pub fn from_config(config: ProviderConfig) -> Result<Self> {
		Self::new(AuthContext::new(config)?)
	}
}
impl<C, M> AuthProvider for SimpleHeaderAuth<C, M>
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
impl<C, M> Debug for SimpleHeaderAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SimpleHeaderAuth")
			.field("context", &self.context)
			.field("target", &self.target)
			.finish()
	}
}
