//! Credential exchange for object-storage clients.
//!
//! Every provider turns an identity and a secret into a storage endpoint plus a session token
//! (and, when advertised, a CDN management URL) through one
//! [`AuthProvider::authenticate`](provider::AuthProvider::authenticate) contract. Pick a
//! provider explicitly or let [`provider::build_provider`] choose one from the configured
//! endpoint string.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth_url;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod secret;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
