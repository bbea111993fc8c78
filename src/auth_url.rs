//! Decomposition of authentication endpoint strings.

// self
use crate::{_prelude::*, error::ConfigError};

/// Authentication endpoint split into its transport-relevant parts.
///
/// Values are derived once from the endpoint string and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedUrl {
	/// Host name or IP literal (IPv6 literals keep their brackets).
	pub host: String,
	/// Explicit port, or the scheme default.
	pub port: u16,
	/// Request target: path with leading `/`, plus the query string when present.
	pub path: String,
	/// Whether the endpoint uses TLS.
	pub is_secure: bool,
	url: Url,
}
impl ParsedUrl {
	/// Parses an `http`/`https` endpoint string.
	pub fn parse(raw: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(raw.trim()).map_err(|e| ConfigError::invalid_url(raw, e.to_string()))?;
		let is_secure = match url.scheme() {
			"https" => true,
			"http" => false,
			other =>
				return Err(ConfigError::invalid_url(raw, format!("unsupported scheme `{other}`"))),
		};
		let host = match url.host_str() {
			Some(host) if !host.is_empty() => host.to_owned(),
			_ => return Err(ConfigError::invalid_url(raw, "missing host")),
		};
		let port = url
			.port_or_known_default()
			.ok_or_else(|| ConfigError::invalid_url(raw, "missing port"))?;
		let path = match url.query() {
			Some(query) => format!("{}?{query}", url.path()),
			None => url.path().to_owned(),
		};

		Ok(Self { host, port, path, is_secure, url })
	}

	/// Full URL the request should target.
	pub fn as_url(&self) -> &Url {
		&self.url
	}

	/// Scheme label matching [`ParsedUrl::is_secure`].
	pub fn scheme(&self) -> &'static str {
		if self.is_secure { "https" } else { "http" }
	}
}
impl Display for ParsedUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}://{}:{}{}", self.scheme(), self.host, self.port, self.path)
	}
}
impl FromStr for ParsedUrl {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_applies_scheme_default_ports() {
		let secure = ParsedUrl::parse("https://auth.api.rackspacecloud.com/v1.0")
			.expect("Secure auth URL should parse.");

		assert_eq!(secure.host, "auth.api.rackspacecloud.com");
		assert_eq!(secure.port, 443);
		assert_eq!(secure.path, "/v1.0");
		assert!(secure.is_secure);

		let plain = ParsedUrl::parse("http://127.0.0.1:8080/auth/v1.0?region=lon")
			.expect("Plain auth URL should parse.");

		assert_eq!(plain.host, "127.0.0.1");
		assert_eq!(plain.port, 8080);
		assert_eq!(plain.path, "/auth/v1.0?region=lon");
		assert!(!plain.is_secure);
		assert_eq!(plain.to_string(), "http://127.0.0.1:8080/auth/v1.0?region=lon");
	}

	#[test]
	fn parse_defaults_empty_path_to_root() {
		let parsed = ParsedUrl::parse("https://example.com").expect("Bare host should parse.");

		assert_eq!(parsed.path, "/");
	}

	#[test]
	fn parse_rejects_unrecognized_input() {
		for raw in ["", "auth.example.com/v1.0", "ftp://example.com/auth", "file:///tmp/auth"] {
			let err = ParsedUrl::parse(raw).expect_err("Malformed auth URL must be rejected.");

			assert!(matches!(err, ConfigError::InvalidUrl { .. }), "unexpected error for {raw:?}");
		}
	}
}
