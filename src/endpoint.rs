//! Normalized authentication result handed to data-plane clients.

// self
use crate::{_prelude::*, secret::Secret};

/// Storage routing information plus the session token issued for it.
///
/// A value only exists for a successful authentication: [`Endpoint::new`] refuses an empty
/// storage URL or token, so providers never hand out partially populated results. The fields are
/// private, so a struct literal cannot bypass that check either:
///
/// ```compile_fail
/// use cloudfiles_auth::{endpoint::Endpoint, secret::Secret};
///
/// let endpoint = Endpoint { storage_url: String::new(), cdn_url: None, token: Secret::new("") };
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
	storage_url: String,
	cdn_url: Option<String>,
	token: Secret,
}
impl Endpoint {
	/// Validates and assembles an endpoint.
	///
	/// Empty optional CDN URLs are normalized to `None`.
	pub fn new(
		storage_url: impl Into<String>,
		cdn_url: Option<String>,
		token: impl Into<Secret>,
	) -> Result<Self> {
		let storage_url = storage_url.into();
		let token = token.into();

		if storage_url.is_empty() {
			return Err(Error::malformed("storage URL is empty"));
		}
		if token.is_empty() {
			return Err(Error::malformed("auth token is empty"));
		}

		Ok(Self { storage_url, cdn_url: cdn_url.filter(|url| !url.is_empty()), token })
	}

	/// Builds an endpoint from constants known to be non-empty.
	pub(crate) fn fixed(storage_url: &'static str, token: &'static str) -> Self {
		debug_assert!(!storage_url.is_empty() && !token.is_empty());

		Self { storage_url: storage_url.into(), cdn_url: None, token: Secret::new(token) }
	}

	/// Storage endpoint used for subsequent data-plane requests.
	pub fn storage_url(&self) -> &str {
		&self.storage_url
	}

	/// CDN management URL, when the service advertises one.
	pub fn cdn_url(&self) -> Option<&str> {
		self.cdn_url.as_deref()
	}

	/// Bearer/session token accompanying data-plane requests.
	pub fn token(&self) -> &Secret {
		&self.token
	}
}
impl Debug for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Endpoint")
			.field("storage_url", &self.storage_url)
			.field("cdn_url", &self.cdn_url)
			.field("token", &self.token)
			.finish()
	}
}
