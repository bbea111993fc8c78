//! Shared configuration + transport composition used by every provider.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{HeaderMap, Method, Request, StatusCode, header::USER_AGENT, request::Builder},
};
// self
use crate::{
	_prelude::*,
	config::ProviderConfig,
	error::ConfigError,
	http::{AuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	obs::ProviderKind,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Context specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthContext = AuthContext<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Configuration plus the transport every provider issues its requests through.
///
/// Providers compose one context instead of inheriting shared state; it holds no mutable
/// protocol state, so one context may back several providers.
pub struct AuthContext<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Identity material and per-request settings.
	pub config: ProviderConfig,
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
}
impl<C, M> AuthContext<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a context that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ProviderConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self { config, http_client: http_client.into(), transport_mapper: mapper.into() }
	}

	/// Starts a request carrying the configured `User-Agent`.
	pub(crate) fn request(&self, method: Method, url: &Url) -> Builder {
		Request::builder()
			.method(method)
			.uri(url.as_str())
			.header(USER_AGENT, self.config.user_agent.as_str())
	}

	/// Performs one round trip.
	///
	/// The transport handle lives only for the duration of this call, so the underlying
	/// connection is released on success, on error statuses, and on transport failures alike.
	pub(crate) async fn send(&self, kind: ProviderKind, request: HttpRequest) -> Result<Reply> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.handle(meta.clone(), self.config.timeout);
		let response = handle.call(request).await.map_err(|err| {
			self.transport_mapper.map_transport_error(kind, meta.take().as_ref(), err)
		})?;

		Ok(Reply { response, meta: meta.take().unwrap_or_default() })
	}
}
#[cfg(feature = "reqwest")]
impl AuthContext<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a context backed by a freshly built reqwest transport.
	pub fn new(config: ProviderConfig) -> Result<Self> {
		Ok(Self::with_http_client(
			config,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for AuthContext<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			http_client: Arc::clone(&self.http_client),
			transport_mapper: Arc::clone(&self.transport_mapper),
		}
	}
}
impl<C, M> Debug for AuthContext<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthContext").field("config", &self.config).finish()
	}
}

/// Response of a single round trip plus the metadata the transport captured.
#[derive(Debug)]
pub(crate) struct Reply {
	pub(crate) response: HttpResponse,
	pub(crate) meta: ResponseMetadata,
}
impl Reply {
	pub(crate) fn status(&self) -> StatusCode {
		self.response.status()
	}

	pub(crate) fn headers(&self) -> &HeaderMap {
		self.response.headers()
	}

	pub(crate) fn body(&self) -> &[u8] {
		self.response.body()
	}

	/// First non-empty, valid value of `name` (header names are case-insensitive).
	pub(crate) fn header(&self, name: &str) -> Option<&str> {
		self.headers()
			.get_all(name)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.map(str::trim)
			.find(|value| !value.is_empty())
	}

	/// Generic failure for a status outside `[200, 300)`.
	///
	/// The reason is the phrase the service sent when the transport captured one, else the
	/// canonical phrase of the status.
	pub(crate) fn non_success(&self) -> Error {
		let status = self.status();
		let reason = self
			.meta
			.reason
			.clone()
			.filter(|reason| !reason.trim().is_empty())
			.or_else(|| status.canonical_reason().map(str::to_owned))
			.unwrap_or_else(|| "Unknown Status".into());

		Error::NonSuccessStatus {
			status: status.as_u16(),
			reason,
			retry_after: self.meta.retry_after,
		}
	}
}

/// Finalizes a request builder with `body`.
pub(crate) fn finish(builder: Builder, body: Vec<u8>) -> Result<HttpRequest> {
	builder.body(body).map_err(|e| ConfigError::from(e).into())
}

/// Finalizes a request builder with an `application/x-www-form-urlencoded` body.
pub(crate) fn finish_form<'a>(
	builder: Builder,
	pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<HttpRequest> {
	let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();

	finish(
		builder.header(oauth2::http::header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
		body.into_bytes(),
	)
}
