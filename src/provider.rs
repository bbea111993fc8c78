//! Authentication providers and the factory that selects one.
//!
//! Every provider implements [`AuthProvider`]: one `authenticate()` call runs the provider's
//! protocol from scratch and resolves to a validated [`Endpoint`] or a typed [`Error`].
//! Providers compose an [`AuthContext`] (configuration + transport) instead of sharing a base
//! type; protocol state lives only inside a single call, so one instance may serve concurrent
//! calls.
//!
//! - [`simple`] performs the single-request header exchange.
//! - [`oauth_browser`] runs the OAuth authorization-code flow with login-form scraping.
//! - [`legacy`] negotiates a session over the JSON-RPC dispatcher.
//! - [`mock`] returns a fixed result without network access.
//! - [`selector`] picks one of the above from an endpoint string.

pub mod legacy;
pub mod mock;
pub mod oauth_browser;
pub mod selector;
pub mod simple;

mod context;

pub use context::*;
pub use legacy::{LegacyEndpoints, LegacySessionAuth, decode_account_username};
pub use mock::MockAuthProvider;
pub use oauth_browser::{OAuthBrowserAuth, OAuthClientConfig, OAuthEndpoints};
pub use selector::*;
pub use simple::SimpleHeaderAuth;

// self
use crate::{_prelude::*, endpoint::Endpoint, obs::ProviderKind};

/// Boxed future returned by [`AuthProvider::authenticate`].
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<Endpoint>> + 'a + Send>>;

/// Capability shared by every authentication strategy.
///
/// Providers are [`Debug`] so boxed trait objects can be logged and inspected; implementations
/// must keep secrets out of that output.
pub trait AuthProvider
where
	Self: Debug + Send + Sync,
{
	/// Stable label of the strategy, used for spans, metrics, and diagnostics.
	fn kind(&self) -> ProviderKind;

	/// Runs the provider's protocol once.
	///
	/// Resolves to the first terminal outcome: an [`Endpoint`] whose storage URL and token are
	/// non-empty, or an error. Nothing is retried and no partial result is ever returned.
	fn authenticate(&self) -> AuthFuture<'_>;
}
impl<P> AuthProvider for Box<P>
where
	P: ?Sized + AuthProvider,
{
	fn kind(&self) -> ProviderKind {
		(**self).kind()
	}

	fn authenticate(&self) -> AuthFuture<'_> {
		(**self).authenticate()
	}
}
impl<P> AuthProvider for Arc<P>
where
	P: ?Sized + AuthProvider,
{
	fn kind(&self) -> ProviderKind {
		(**self).kind()
	}

	fn authenticate(&self) -> AuthFuture<'_> {
		(**self).authenticate()
	}
}
