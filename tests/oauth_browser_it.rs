#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::{Mock, prelude::*};
// self
use cloudfiles_auth::{
	config::ProviderConfig,
	error::{Error, ErrorKind},
	provider::{
		AuthProvider, OAuthBrowserAuth, OAuthClientConfig, OAuthEndpoints,
		oauth_browser::ReqwestOAuthBrowserAuth,
	},
};
use common::{SECRET, test_config, test_context};

const CLIENT_ID: &str = "api_hubic_1";
const CLIENT_SECRET: &str = "s3cr3t";
// base64("api_hubic_1:s3cr3t")
const BASIC_AUTH: &str = "Basic YXBpX2h1YmljXzE6czNjcjN0";
const REDIRECT_URI: &str = "https://app.example.com/callback";
const FORM_TOKEN: &str = "8741962";
const AUTH_CODE: &str = "code-5f1b";
const ACCESS_TOKEN: &str = "access-9c2e";
const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <form action="/oauth/auth/" method="POST">
      <input type="hidden" name="action" value="accepted" />
      <input type="hidden" name="oauth" value="8741962" />
      <input type="text" name="login" />
      <input type="password" name="user_pwd" />
      <button type="submit">Accept</button>
    </form>
  </body>
</html>"#;
const CREDENTIALS_BODY: &str = r#"{
	"endpoint": "https://lb1.hubic.ovh.net/v1/AUTH_f00d",
	"token": "swift-token-77",
	"expires": "2026-10-20T08:00:00+02:00"
}"#;

fn provider(server: &MockServer) -> ReqwestOAuthBrowserAuth {
	let client = OAuthClientConfig::new(CLIENT_ID, CLIENT_SECRET, REDIRECT_URI)
		.expect("OAuth client config should be valid.");
	let endpoints = OAuthEndpoints::new(server.url("/oauth/"), server.url("/1.0/"));

	OAuthBrowserAuth::with_endpoints(test_context(test_config("hubic")), client, endpoints)
		.expect("OAuth provider should build against the mock server.")
}

async fn mock_authorize(server: &MockServer) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/oauth/auth/")
				.query_param("client_id", CLIENT_ID)
				.query_param("redirect_uri", REDIRECT_URI)
				.query_param("scope", "credentials.r,account.r")
				.query_param("response_type", "code")
				.query_param_exists("state");
			then.status(200).header("content-type", "text/html; charset=utf-8").body(LOGIN_PAGE);
		})
		.await
}

async fn mock_login<'a>(server: &'a MockServer, status: u16, location: &str) -> Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/auth/")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("action=accepted")
				.body_includes(format!("oauth={FORM_TOKEN}"))
				.body_includes("login=jdoe%40example.com")
				.body_includes(format!("user_pwd={SECRET}"));
			then.status(status).header("location", location);
		})
		.await
}

async fn mock_token<'a>(server: &'a MockServer, status: u16, body: &str) -> Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token/")
				.header("authorization", BASIC_AUTH)
				.header("user-agent", ProviderConfig::DEFAULT_USER_AGENT)
				.body_includes("grant_type=authorization_code")
				.body_includes(format!("code={AUTH_CODE}"));
			then.status(status).header("content-type", "application/json").body(body);
		})
		.await
}

async fn mock_credentials<'a>(server: &'a MockServer, status: u16, body: &str) -> Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/1.0/account/credentials/")
				.header("authorization", format!("Bearer {ACCESS_TOKEN}"));
			then.status(status).header("content-type", "application/json").body(body);
		})
		.await
}

fn token_body(token_type: &str) -> String {
	format!(
		r#"{{"access_token":"{ACCESS_TOKEN}","token_type":"{token_type}","expires_in":21600}}"#
	)
}

fn redirect_with_code() -> String {
	format!("{REDIRECT_URI}?code={AUTH_CODE}&scope=credentials.r")
}

#[tokio::test]
async fn authenticate_walks_every_stage() {
	let server = MockServer::start_async().await;
	let authorize = mock_authorize(&server).await;
	let login = mock_login(&server, 302, &redirect_with_code()).await;
	let token = mock_token(&server, 200, &token_body("Bearer")).await;
	let credentials = mock_credentials(&server, 200, CREDENTIALS_BODY).await;
	let endpoint = provider(&server).authenticate().await.expect("OAuth flow should succeed.");

	authorize.assert_async().await;
	login.assert_async().await;
	token.assert_async().await;
	credentials.assert_async().await;

	assert_eq!(endpoint.storage_url(), "https://lb1.hubic.ovh.net/v1/AUTH_f00d");
	assert_eq!(endpoint.cdn_url(), None);
	assert_eq!(endpoint.token().expose(), "swift-token-77");
}

#[tokio::test]
async fn bearer_token_type_is_case_insensitive() {
	for token_type in ["Bearer", "bearer", "BEARER"] {
		let server = MockServer::start_async().await;
		let _authorize = mock_authorize(&server).await;
		let _login = mock_login(&server, 302, &redirect_with_code()).await;
		let _token = mock_token(&server, 200, &token_body(token_type)).await;
		let _credentials = mock_credentials(&server, 200, CREDENTIALS_BODY).await;
		let endpoint = provider(&server)
			.authenticate()
			.await
			.unwrap_or_else(|e| panic!("`{token_type}` should be accepted: {e:?}."));

		assert_eq!(endpoint.token().expose(), "swift-token-77");
	}
}

#[tokio::test]
async fn other_token_types_are_malformed() {
	for token_type in ["mac", "pop"] {
		let server = MockServer::start_async().await;
		let _authorize = mock_authorize(&server).await;
		let _login = mock_login(&server, 302, &redirect_with_code()).await;
		let _token = mock_token(&server, 200, &token_body(token_type)).await;
		let credentials = mock_credentials(&server, 200, CREDENTIALS_BODY).await;
		let err = provider(&server).authenticate().await.expect_err("Token type must be refused.");

		assert_eq!(err.kind(), ErrorKind::MalformedResponse, "{token_type}: {err:?}");
		assert_eq!(credentials.calls_async().await, 0);
	}
}

#[tokio::test]
async fn foreign_redirect_is_rejected_not_malformed() {
	let server = MockServer::start_async().await;
	let _authorize = mock_authorize(&server).await;
	let login =
		mock_login(&server, 302, &format!("https://attacker.example.net/cb?code={AUTH_CODE}"))
			.await;
	let token = mock_token(&server, 200, &token_body("bearer")).await;
	let err = provider(&server).authenticate().await.expect_err("Foreign redirect must fail.");

	login.assert_async().await;

	assert!(matches!(err, Error::CredentialsRejected { .. }), "{err:?}");
	assert_eq!(token.calls_async().await, 0);
}

#[tokio::test]
async fn redirect_with_foreign_state_is_rejected_before_code_exchange() {
	let server = MockServer::start_async().await;
	let _authorize = mock_authorize(&server).await;
	let login =
		mock_login(&server, 302, &format!("{REDIRECT_URI}?state=foreign&code={AUTH_CODE}")).await;
	let token = mock_token(&server, 200, &token_body("Bearer")).await;
	let err = provider(&server).authenticate().await.expect_err("Foreign state must fail.");

	login.assert_async().await;

	match err {
		Error::CredentialsRejected { reason } => assert!(reason.contains("state"), "{reason}"),
		other => panic!("Expected credentials rejected, got {other:?}."),
	}

	assert_eq!(token.calls_async().await, 0);
}

#[tokio::test]
async fn login_without_redirect_is_rejected() {
	let server = MockServer::start_async().await;
	let _authorize = mock_authorize(&server).await;
	let _login = mock_login(&server, 200, "").await;
	let err = provider(&server).authenticate().await.expect_err("Login page echo must fail.");

	assert_eq!(err.kind(), ErrorKind::CredentialsRejected);
}

#[tokio::test]
async fn redirect_carrying_an_error_is_rejected() {
	let server = MockServer::start_async().await;
	let _authorize = mock_authorize(&server).await;
	let _login = mock_login(
		&server,
		302,
		&format!("{REDIRECT_URI}?error=access_denied&error_description=user+refused"),
	)
	.await;
	let err = provider(&server).authenticate().await.expect_err("Denied access must fail.");

	match err {
		Error::CredentialsRejected { reason } => assert!(reason.contains("access_denied")),
		other => panic!("Expected credentials rejected, got {other:?}."),
	}
}

#[tokio::test]
async fn unknown_client_is_rejected_at_authorize() {
	let server = MockServer::start_async().await;
	let authorize = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/auth/");
			then.status(302).header(
				"location",
				format!("{REDIRECT_URI}?error=invalid_client&error_description=unknown+client"),
			);
		})
		.await;
	let err = provider(&server).authenticate().await.expect_err("Unknown client must fail.");

	authorize.assert_async().await;

	match err {
		Error::CredentialsRejected { reason } => {
			assert!(reason.contains("invalid_client: unknown client"), "{reason}");
		},
		other => panic!("Expected credentials rejected, got {other:?}."),
	}
}

#[tokio::test]
async fn authorization_page_without_form_token_is_malformed() {
	let server = MockServer::start_async().await;
	let _authorize = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/auth/");
			then.status(200).body("<html><body><p>Maintenance in progress.</p></body></html>");
		})
		.await;
	let login = mock_login(&server, 302, &redirect_with_code()).await;
	let err = provider(&server).authenticate().await.expect_err("Missing form token must fail.");

	assert_eq!(err.kind(), ErrorKind::MalformedResponse);
	assert_eq!(login.calls_async().await, 0);
}

#[tokio::test]
async fn refused_code_exchange_is_rejected() {
	let server = MockServer::start_async().await;
	let _authorize = mock_authorize(&server).await;
	let _login = mock_login(&server, 302, &redirect_with_code()).await;
	let _token = mock_token(
		&server,
		401,
		r#"{"error":"invalid_client","error_description":"bad client credentials"}"#,
	)
	.await;
	let err = provider(&server).authenticate().await.expect_err("Refused exchange must fail.");

	match err {
		Error::CredentialsRejected { reason } => assert!(reason.contains("invalid_client")),
		other => panic!("Expected credentials rejected, got {other:?}."),
	}
}

#[tokio::test]
async fn credentials_without_token_are_malformed() {
	let server = MockServer::start_async().await;
	let _authorize = mock_authorize(&server).await;
	let _login = mock_login(&server, 302, &redirect_with_code()).await;
	let _token = mock_token(&server, 200, &token_body("bearer")).await;
	let _credentials =
		mock_credentials(&server, 200, r#"{"endpoint":"https://lb1.hubic.ovh.net/v1/AUTH_f00d"}"#)
			.await;
	let err = provider(&server).authenticate().await.expect_err("Missing token must fail.");

	match err {
		Error::MalformedResponse { reason } => assert!(reason.contains("account credentials")),
		other => panic!("Expected malformed response, got {other:?}."),
	}
}

#[tokio::test]
async fn revoked_access_token_is_rejected() {
	let server = MockServer::start_async().await;
	let _authorize = mock_authorize(&server).await;
	let _login = mock_login(&server, 302, &redirect_with_code()).await;
	let _token = mock_token(&server, 200, &token_body("bearer")).await;
	let _credentials = mock_credentials(&server, 401, r#"{"error":"invalid_token"}"#).await;
	let err = provider(&server).authenticate().await.expect_err("Revoked token must fail.");

	assert_eq!(err.kind(), ErrorKind::CredentialsRejected);
}
