//! Plugs a non-reqwest transport into the providers.
//!
//! 1. Implement [`AuthHttpClient`] so every handle records [`ResponseMetadata`] in the slot it
//!    was given.
//! 2. Provide a [`TransportErrorMapper`] that turns the transport's own failures into
//!    connectivity errors.
//! 3. Hand both to [`AuthContext::with_http_client`] and let [`build_provider`] pick the
//!    provider from the configured endpoint string.

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	time::Duration as StdDuration,
};
// crates.io
use color_eyre::Result;
use time::Duration;
// self
use cloudfiles_auth::{
	config::ProviderConfig,
	error::{Error, TransportError},
	http::{AuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode},
	},
	obs::ProviderKind,
	provider::{AuthContext, AuthProvider, build_provider},
};

const AUTH_URL: &str = "https://auth.example.com/v1.0";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let provider = demo_provider(CannedHttpClient::success())?;
	let endpoint = provider.authenticate().await?;

	println!("Storage URL issued by the canned transport: {}.", endpoint.storage_url());

	let failing = demo_provider(CannedHttpClient::transport_error(CannedTransportError::DnsFailure {
		host: "auth.example.com",
	}))?;

	match failing.authenticate().await {
		Ok(_) => println!("Canned transport unexpectedly succeeded."),
		Err(e) => println!("Transport failure classified as {}: {e}.", e.kind()),
	}

	let closed = demo_provider(CannedHttpClient::other_error("upstream connection closed"))?;

	match closed.authenticate().await {
		Ok(_) => println!("Canned transport unexpectedly produced an endpoint."),
		Err(e) => println!("An HttpClientError::Other variant made it through the mapper: {e}."),
	}

	Ok(())
}

fn demo_provider(client: CannedHttpClient) -> Result<Box<dyn AuthProvider>> {
	let config = ProviderConfig::new("demo-user", "demo-api-key").with_auth_url(AUTH_URL);
	let context = <AuthContext<CannedHttpClient, CannedTransportErrorMapper>>::with_http_client(
		config,
		client,
		CannedTransportErrorMapper,
	);

	Ok(build_provider(context)?)
}

#[derive(Clone, Debug)]
enum CannedTransportError {
	DnsFailure { host: &'static str },
}
impl Display for CannedTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::DnsFailure { host } => write!(f, "DNS lookup failed for {host}"),
		}
	}
}
impl StdError for CannedTransportError {}

#[derive(Clone)]
enum CannedBehavior {
	Success,
	TransportError(CannedTransportError),
	Other(&'static str),
}

#[derive(Clone)]
struct CannedHttpClient {
	behavior: CannedBehavior,
}
impl CannedHttpClient {
	fn success() -> Self {
		Self { behavior: CannedBehavior::Success }
	}

	fn transport_error(error: CannedTransportError) -> Self {
		Self { behavior: CannedBehavior::TransportError(error) }
	}

	fn other_error(message: &'static str) -> Self {
		Self { behavior: CannedBehavior::Other(message) }
	}
}
impl AuthHttpClient for CannedHttpClient {
	type Handle = CannedHttpHandle;
	type TransportError = CannedTransportError;

	fn handle(&self, slot: ResponseMetadataSlot, _timeout: StdDuration) -> Self::Handle {
		CannedHttpHandle { slot, behavior: self.behavior.clone() }
	}
}

struct CannedHttpHandle {
	slot: ResponseMetadataSlot,
	behavior: CannedBehavior,
}
impl<'a> AsyncHttpClient<'a> for CannedHttpHandle {
	type Error = HttpClientError<CannedTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let behavior = self.behavior.clone();

		Box::pin(async move {
			slot.take();

			match behavior {
				CannedBehavior::Success => {
					slot.store(ResponseMetadata { status: Some(204), ..Default::default() });

					let mut response = HttpResponse::new(Vec::new());

					*response.status_mut() = StatusCode::NO_CONTENT;

					let headers = response.headers_mut();

					headers.insert(
						"x-storage-url",
						"https://storage.example.com/v1/AUTH_demo".parse().map_err(other)?,
					);
					headers.insert("x-auth-token", "canned-token".parse().map_err(other)?);

					Ok(response)
				},
				CannedBehavior::TransportError(error) => {
					slot.store(ResponseMetadata {
						retry_after: Some(Duration::seconds(2)),
						..Default::default()
					});

					// `HttpClientError::Reqwest` boxes any transport error despite its name.
					Err(HttpClientError::Reqwest(Box::new(error)))
				},
				CannedBehavior::Other(message) => Err(HttpClientError::Other(message.to_owned())),
			}
		})
	}
}

fn other(err: impl Display) -> HttpClientError<CannedTransportError> {
	HttpClientError::Other(err.to_string())
}

#[derive(Clone, Copy, Debug, Default)]
struct CannedTransportErrorMapper;
impl TransportErrorMapper<CannedTransportError> for CannedTransportErrorMapper {
	fn map_transport_error(
		&self,
		_provider: ProviderKind,
		_metadata: Option<&ResponseMetadata>,
		error: HttpClientError<CannedTransportError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			other => TransportError::Other { message: other.to_string() }.into(),
		}
	}
}
