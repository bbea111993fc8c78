//! Error taxonomy shared by every authentication provider.

// self
use crate::{_prelude::*, obs::ProviderKind};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by [`AuthProvider::authenticate`](crate::provider::AuthProvider).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Connectivity failure (DNS, TCP, TLS, timeout); left to the caller to interpret.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The service explicitly refused the supplied identity or secret.
	#[error("Authentication service rejected the credentials: {reason}.")]
	CredentialsRejected {
		/// Provider- or service-supplied reason string.
		reason: String,
	},
	/// The service answered successfully but the payload cannot be normalized.
	#[error("Authentication service returned a malformed response: {reason}.")]
	MalformedResponse {
		/// Description of what was missing or unparsable.
		reason: String,
	},
	/// Any other non-2xx status.
	#[error("Authentication service responded with {status} {reason}.")]
	NonSuccessStatus {
		/// HTTP status code.
		status: u16,
		/// Reason phrase sent by the service, else the canonical phrase of the status.
		reason: String,
		/// Retry-After hint from upstream, if supplied. Informational only.
		retry_after: Option<Duration>,
	},
}
impl Error {
	/// Returns the flat classification of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::Config,
			Self::Transport(_) => ErrorKind::Connectivity,
			Self::CredentialsRejected { .. } => ErrorKind::CredentialsRejected,
			Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
			Self::NonSuccessStatus { .. } => ErrorKind::NonSuccessStatus,
		}
	}

	pub(crate) fn rejected(reason: impl Into<String>) -> Self {
		Self::CredentialsRejected { reason: reason.into() }
	}

	pub(crate) fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedResponse { reason: reason.into() }
	}
}

/// Flat view over [`Error`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// See [`Error::CredentialsRejected`].
	CredentialsRejected,
	/// See [`Error::MalformedResponse`].
	MalformedResponse,
	/// See [`Error::NonSuccessStatus`].
	NonSuccessStatus,
	/// See [`Error::Transport`].
	Connectivity,
	/// See [`Error::Config`].
	Config,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::CredentialsRejected => "credentials_rejected",
			ErrorKind::MalformedResponse => "malformed_response",
			ErrorKind::NonSuccessStatus => "non_success_status",
			ErrorKind::Connectivity => "connectivity",
			ErrorKind::Config => "config",
		}
	}

	/// Whether the kind belongs to the protocol taxonomy (as opposed to local or
	/// connectivity failures).
	pub const fn is_taxonomy(self) -> bool {
		matches!(
			self,
			ErrorKind::CredentialsRejected
				| ErrorKind::MalformedResponse
				| ErrorKind::NonSuccessStatus
		)
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised before or while building requests.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Authentication endpoint is not a usable `http`/`https` URL.
	#[error("Authentication URL `{url}` is invalid: {reason}.")]
	InvalidUrl {
		/// Offending input.
		url: String,
		/// What made the input unusable.
		reason: String,
	},
	/// A tagged provider selector could not be decoded.
	#[error("Provider selector is invalid: {reason}.")]
	InvalidSelector {
		/// What made the selector unusable.
		reason: String,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// An RPC argument list could not be encoded.
	#[error("RPC parameters could not be encoded.")]
	RpcParams(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	pub(crate) fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
		Self::InvalidUrl { url: url.to_owned(), reason: reason.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the authentication service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// A single network operation exceeded the configured timeout.
	#[error("Request to the {provider} authentication service timed out.")]
	Timeout {
		/// Provider that issued the request.
		provider: ProviderKind,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the authentication service.")]
	Io(#[from] std::io::Error),
	/// Transport failure described only by a message.
	#[error("HTTP client error occurred while calling the authentication service: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn kinds_split_taxonomy_from_local_failures() {
		let rejected = Error::rejected("unknown username `alice`");
		let malformed = Error::malformed("missing x-storage-url header");
		let status = Error::NonSuccessStatus {
			status: 503,
			reason: "Service Unavailable".into(),
			retry_after: None,
		};
		let timeout = Error::from(TransportError::Timeout { provider: ProviderKind::SimpleHeader });

		assert_eq!(rejected.kind(), ErrorKind::CredentialsRejected);
		assert_eq!(malformed.kind(), ErrorKind::MalformedResponse);
		assert_eq!(status.kind(), ErrorKind::NonSuccessStatus);
		assert_eq!(timeout.kind(), ErrorKind::Connectivity);
		assert!(status.kind().is_taxonomy());
		assert!(!timeout.kind().is_taxonomy());
	}

	#[test]
	fn messages_carry_diagnostics() {
		let status = Error::NonSuccessStatus {
			status: 500,
			reason: "Internal Server Error".into(),
			retry_after: None,
		};

		assert_eq!(
			status.to_string(),
			"Authentication service responded with 500 Internal Server Error."
		);
		assert!(Error::rejected("unknown username `bob`").to_string().contains("unknown username"));
	}
}
