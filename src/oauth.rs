//! Transport error mapping plus the `oauth2`-backed authorization-code exchange.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, HttpRequest, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenType},
	http::{Error as HttpError, HeaderValue, header::USER_AGENT},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::{AuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::ProviderKind,
	secret::Secret,
};

type TokenEndpointClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Maps HTTP transport failures into crate [`Error`] values.
///
/// Mapped errors stay in the connectivity ([`Error::Transport`]) or local
/// ([`Error::Config`]) categories; they are never translated into the protocol taxonomy.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		provider: ProviderKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		provider: ProviderKind,
		_meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(provider, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ =>
				TransportError::Other { message: "unrecognized HTTP client failure".into() }.into(),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(provider: ProviderKind, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { provider }.into();
	}

	TransportError::from(err).into()
}

/// Token-endpoint client for the authorization-code grant with HTTP Basic client auth.
pub(crate) struct CodeExchange {
	oauth_client: TokenEndpointClient,
	redirect_uri: RedirectUrl,
}
impl CodeExchange {
	pub(crate) fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: &Secret,
		redirect_uri: &str,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_url.to_string())
			.map_err(|e| ConfigError::invalid_url(token_url.as_str(), e.to_string()))?;
		let redirect_uri = RedirectUrl::new(redirect_uri.to_owned())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		Ok(Self { oauth_client, redirect_uri })
	}

	/// Exchanges `code` for a bearer access token, sending `user_agent` like every other request.
	///
	/// Any non-200 answer is a client registration problem (credentials rejected); a 200
	/// answer that cannot be parsed, or a token type other than bearer, is malformed.
	pub(crate) async fn exchange<C, M>(
		&self,
		http_client: &C,
		mapper: &M,
		timeout: StdDuration,
		user_agent: &str,
		code: &str,
	) -> Result<Secret>
	where
		C: ?Sized + AuthHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		let user_agent = HeaderValue::from_str(user_agent)
			.map_err(|e| ConfigError::from(HttpError::from(e)))?;
		let meta = ResponseMetadataSlot::default();
		let handle = http_client.handle(meta.clone(), timeout);
		let client = UserAgentClient { inner: handle, user_agent };
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_redirect_uri(Cow::Borrowed(&self.redirect_uri))
			.request_async(&client)
			.await
			.map_err(|err| map_request_error(meta.take(), err, mapper))?;

		if *response.token_type() == BasicTokenType::Bearer {
			return Ok(Secret::new(response.access_token().secret().clone()));
		}

		let token_type = match response.token_type() {
			BasicTokenType::Extension(other) => other.clone(),
			other => format!("{other:?}").to_ascii_lowercase(),
		};

		Err(Error::malformed(format!("unsupported access token type `{token_type}`")))
	}
}

/// Stamps the configured `User-Agent` on requests issued by `oauth2`.
struct UserAgentClient<H> {
	inner: H,
	user_agent: HeaderValue,
}
impl<'c, H> AsyncHttpClient<'c> for UserAgentClient<H>
where
	H: AsyncHttpClient<'c>,
{
	type Error = H::Error;
	type Future = H::Future;

	fn call(&'c self, mut request: HttpRequest) -> Self::Future {
		request.headers_mut().insert(USER_AGENT, self.user_agent.clone());

		self.inner.call(request)
	}
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let status = meta.as_ref().and_then(|value| value.status);
	let rejected = status != Some(200);

	match err {
		RequestTokenError::ServerResponse(response) =>
			rejected_exchange(status, describe_server_error(&response)),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(ProviderKind::OAuthBrowser, meta.as_ref(), error),
		RequestTokenError::Parse(error, body) if rejected =>
			rejected_exchange(status, body_preview(&body).unwrap_or_else(|| error.to_string())),
		RequestTokenError::Parse(error, _) =>
			Error::malformed(format!("token response is invalid at `{}`", error.path())),
		RequestTokenError::Other(message) if rejected => rejected_exchange(status, message),
		RequestTokenError::Other(message) => Error::malformed(message),
	}
}

fn rejected_exchange(status: Option<u16>, detail: String) -> Error {
	let status = status.map_or_else(|| "unknown".into(), |code| code.to_string());

	Error::rejected(format!(
		"unable to get an access token, wrong client_id or client_secret? \
		 (status {status}, {detail})"
	))
}

fn describe_server_error(response: &BasicErrorResponse) -> String {
	match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	}
}

/// Lossy, truncated preview of a response body for diagnostics.
pub(crate) fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() {
		return None;
	}
	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		return Some(text.to_owned());
	}

	let mut buf = text.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	Some(buf)
}
