//! Session negotiation over the legacy hubiC JSON-RPC dispatcher.
//!
//! Every call is a `GET {base}rest.dispatcher/<method>?params=<json>` answered by an envelope
//! `{ "answer": …, "error": … }`. The provider runs four calls in order, each feeding the next:
//! `getAnonymousSession`, `getHubics`, `login`, `getHubic`.
//!
//! The final record carries no storage URL of its own. Its base64-encoded `username` is decoded
//! and returned as [`Endpoint::storage_url`]; this is a quirk of this protocol version, and
//! callers should treat the value as an opaque routing identifier rather than assume it is a
//! URL shaped like the ones the other providers return.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth_url::ParsedUrl,
	endpoint::Endpoint,
	error::ConfigError,
	http::AuthHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, AuthSpan, ProviderKind},
	provider::{
		AuthFuture, AuthProvider,
		context::{self, AuthContext},
	},
};
#[cfg(feature = "reqwest")]
use crate::{config::ProviderConfig, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const KIND: ProviderKind = ProviderKind::LegacySession;
const LOGIN_CONTEXT: &str = "hubic";

#[cfg(feature = "reqwest")]
/// Dispatcher session negotiation over the default reqwest transport.
pub type ReqwestLegacySessionAuth =
	LegacySessionAuth<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Decodes the base64 (standard alphabet, padded) account username of the final record.
pub fn decode_account_username(encoded: &str) -> Result<Vec<u8>> {
	STANDARD
		.decode(encoded.trim())
		.map_err(|e| Error::malformed(format!("account username is not valid base64 ({e})")))
}

/// Location of the JSON-RPC dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyEndpoints {
	/// Base URL; `rest.dispatcher/<method>` is appended to it.
	pub dispatcher_base: String,
}
impl LegacyEndpoints {
	/// Production hubiC dispatcher base.
	pub const HUBIC_DISPATCHER_BASE: &'static str = "https://ws.ovh.com/hubic/r5/";

	/// Creates a custom dispatcher location.
	pub fn new(dispatcher_base: impl Into<String>) -> Self {
		Self { dispatcher_base: dispatcher_base.into() }
	}

	fn resolve(&self) -> Result<Url> {
		let base = if self.dispatcher_base.ends_with('/') {
			self.dispatcher_base.clone()
		} else {
			format!("{}/", self.dispatcher_base)
		};

		ParsedUrl::parse(&base)?
			.as_url()
			.join("rest.dispatcher/")
			.map_err(|e| ConfigError::invalid_url(&base, e.to_string()).into())
	}
}
impl Default for LegacyEndpoints {
	fn default() -> Self {
		Self::new(Self::HUBIC_DISPATCHER_BASE)
	}
}

/// Account identifier; the dispatcher has used both numeric and string forms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum AccountId {
	Number(u64),
	Text(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
	answer: Option<T>,
	error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SessionAnswer {
	session: SessionRef,
}

#[derive(Debug, Deserialize)]
struct SessionRef {
	id: String,
}

#[derive(Debug, Deserialize)]
struct AccountRef {
	id: AccountId,
	nic: String,
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
	credentials: AccountCredentials,
}

#[derive(Debug, Deserialize)]
struct AccountCredentials {
	username: String,
	secret: String,
}

#[derive(Serialize)]
struct NoParams {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountsParams<'a> {
	session_id: &'a str,
	email: &'a str,
}

#[derive(Serialize)]
struct LoginParams<'a> {
	login: &'a str,
	password: &'a str,
	context: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountParams<'a> {
	session_id: &'a str,
	hubic_id: &'a AccountId,
}

/// Provider negotiating a session through the JSON-RPC dispatcher.
///
/// Any non-200 dispatcher status is [`Error::MalformedResponse`]. An unknown username
/// (`getHubics` answering nothing) and a refused `login` are [`Error::CredentialsRejected`].
pub struct LegacySessionAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	context: AuthContext<C, M>,
	endpoints: LegacyEndpoints,
	dispatcher: Url,
}
impl<C, M> LegacySessionAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider against the production dispatcher.
	pub fn new(context: AuthContext<C, M>) -> Result<Self> {
		Self::with_endpoints(context, LegacyEndpoints::default())
	}

	/// Creates a provider against a custom dispatcher.
	pub fn with_endpoints(context: AuthContext<C, M>, endpoints: LegacyEndpoints) -> Result<Self> {
		let dispatcher = endpoints.resolve()?;

		Ok(Self { context, endpoints, dispatcher })
	}

	/// Dispatcher the provider talks to.
	pub fn endpoints(&self) -> &LegacyEndpoints {
		&self.endpoints
	}

	async fn run(&self) -> Result<Endpoint> {
		let credentials = &self.context.config.credentials;
		let anonymous = self.call::<SessionAnswer>("getAnonymousSession", &NoParams {}).await?;
		let anonymous = required(anonymous, "getAnonymousSession")?.session.id;
		let accounts = self
			.call::<Vec<AccountRef>>(
				"getHubics",
				&AccountsParams { session_id: &anonymous, email: &credentials.identity },
			)
			.await?;

		if accounts.error.is_some() {
			return Err(Error::rejected(format!(
				"unknown username `{}` ({})",
				credentials.identity,
				describe_rpc_error(accounts.error.as_ref())
			)));
		}

		let account = accounts
			.answer
			.and_then(|list| list.into_iter().next())
			.ok_or_else(|| {
				Error::rejected(format!("unknown username `{}`", credentials.identity))
			})?;
		let login = self
			.call::<SessionAnswer>(
				"login",
				&LoginParams {
					login: &account.nic,
					password: credentials.secret.expose(),
					context: LOGIN_CONTEXT,
				},
			)
			.await?;
		let session = match login {
			Envelope { answer: Some(answer), error: None } => answer.session.id,
			Envelope { error, .. } => {
				return Err(Error::rejected(format!(
					"invalid password for `{}` ({})",
					credentials.identity,
					describe_rpc_error(error.as_ref())
				)));
			},
		};
		let record = self
			.call::<AccountRecord>(
				"getHubic",
				&AccountParams { session_id: &session, hubic_id: &account.id },
			)
			.await?;
		let record = required(record, "getHubic")?;
		let username = String::from_utf8(decode_account_username(&record.credentials.username)?)
			.map_err(|_| Error::malformed("decoded account username is not UTF-8"))?;

		Endpoint::new(username, None, record.credentials.secret)
	}

	/// Issues one dispatcher call inside its own stage span.
	async fn call<T>(&self, method: &'static str, params: &impl Serialize) -> Result<Envelope<T>>
	where
		T: DeserializeOwned,
	{
		AuthSpan::new(KIND, method).instrument(self.dispatch(method, params)).await
	}

	async fn dispatch<T>(&self, method: &str, params: &impl Serialize) -> Result<Envelope<T>>
	where
		T: DeserializeOwned,
	{
		let params = serde_json::to_string(params).map_err(ConfigError::from)?;
		let mut url = self
			.dispatcher
			.join(method)
			.map_err(|e| ConfigError::invalid_url(self.dispatcher.as_str(), e.to_string()))?;

		url.query_pairs_mut().append_pair("params", &params);

		let request = context::finish(self.context.request(Method::GET, &url), Vec::new())?;
		let reply = self.context.send(KIND, request).await?;

		if reply.status() != StatusCode::OK {
			return Err(Error::malformed(format!(
				"`{method}` answered with status {}",
				reply.status().as_u16()
			)));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(reply.body());

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
			Error::malformed(format!("`{method}` answer is invalid at `{}`", e.path()))
		})
	}
}
#[cfg(feature = "reqwest")]
impl LegacySessionAuth<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a provider over a freshly built reqwest transport.
	pub fn from_config(config: ProviderConfig) -> Result<Self> {
		Self::new(AuthContext::new(config)?)
	}
}
impl<C, M> AuthProvider for LegacySessionAuth<C, M>
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
impl<C, M> Debug for LegacySessionAuth<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LegacySessionAuth")
			.field("context", &self.context)
			.field("endpoints", &self.endpoints)
			.finish()
	}
}

/// Answer of a call that must succeed; any `error` or missing answer is malformed.
fn required<T>(envelope: Envelope<T>, method: &str) -> Result<T> {
	if envelope.error.is_some() {
		return Err(Error::malformed(format!(
			"`{method}` failed ({})",
			describe_rpc_error(envelope.error.as_ref())
		)));
	}

	envelope.answer.ok_or_else(|| Error::malformed(format!("`{method}` returned no answer")))
}

fn describe_rpc_error(error: Option<&Value>) -> String {
	match error {
		Some(Value::Object(fields)) => fields
			.get("message")
			.and_then(Value::as_str)
			.map(str::to_owned)
			.unwrap_or_else(|| Value::Object(fields.clone()).to_string()),
		Some(Value::String(message)) => message.clone(),
		Some(other) => other.to_string(),
		None => "empty answer".into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn username_decoding_recovers_arbitrary_bytes() {
		let samples: [&[u8]; 5] = [
			b"",
			b"https://storage.example.com/v1/AUTH_account",
			"d\u{e9}j\u{e0} vu \u{1f600}".as_bytes(),
			&[0x00, 0xff, 0xfe, 0x80, 0x7f],
			&[0xc3, 0x28, 0xa0, 0xa1],
		];

		for sample in samples {
			let encoded = STANDARD.encode(sample);
			let decoded = decode_account_username(&encoded).expect("Encoded sample should decode.");

			assert_eq!(decoded, sample);
		}

		assert!(matches!(
			decode_account_username("not base64!"),
			Err(Error::MalformedResponse { .. })
		));
	}

	#[test]
	fn envelope_accepts_missing_and_null_fields() {
		let envelope: Envelope<Vec<AccountRef>> =
			serde_json::from_str(r#"{"answer":[{"id":42,"nic":"ab123-ovh"}],"error":null}"#)
				.expect("Envelope should parse.");
		let accounts = envelope.answer.expect("Answer should be present.");

		assert_eq!(accounts[0].id, AccountId::Number(42));
		assert!(envelope.error.is_none());

		let envelope: Envelope<Vec<AccountRef>> =
			serde_json::from_str(r#"{"error":{"message":"denied"}}"#)
				.expect("Envelope should parse.");

		assert!(envelope.answer.is_none());
		assert_eq!(describe_rpc_error(envelope.error.as_ref()), "denied");
	}

	#[test]
	fn account_ids_round_trip_through_params() {
		let params = AccountParams { session_id: "s-1", hubic_id: &AccountId::Text("h-7".into()) };
		let encoded = serde_json::to_string(&params).expect("Params should encode.");

		assert_eq!(encoded, r#"{"sessionId":"s-1","hubicId":"h-7"}"#);
	}

	#[test]
	fn dispatcher_url_is_derived_from_base() {
		let dispatcher = LegacyEndpoints::new("https://ws.ovh.com/hubic/r5")
			.resolve()
			.expect("Dispatcher base should resolve.");

		assert_eq!(dispatcher.as_str(), "https://ws.ovh.com/hubic/r5/rest.dispatcher/");
		assert_eq!(
			dispatcher.join("getHubics").expect("Method URL should join.").as_str(),
			"https://ws.ovh.com/hubic/r5/rest.dispatcher/getHubics"
		);
	}
}
