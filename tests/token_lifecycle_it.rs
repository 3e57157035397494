// crates.io
use httpmock::prelude::*;
// self
use oauth1_storage::{
	auth::{Credential, TokenState},
	consumer::Consumer,
	error::{ConfigError, Error, ProtocolError, TransportError},
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	reqwest,
	session::{ReqwestSession, Session},
	url::Url,
};

const CONSUMER_KEY: &str = "consumer-key";
const CONSUMER_SECRET: &str = "consumer-secret";

/// Reqwest session trusting the mock server's self-signed certificate.
fn mock_session(consumer: Consumer) -> ReqwestSession {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	Session::with_http_client(
		consumer,
		ReqwestHttpClient::with_client(client),
		ReqwestTransportErrorMapper,
	)
}

fn endpoint(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.")
}

fn build_session(server: &MockServer) -> ReqwestSession {
	let consumer = Consumer::builder(CONSUMER_KEY, CONSUMER_SECRET)
		.request_token_endpoint(endpoint(server, "/oauth/request_token"))
		.authorization_endpoint(endpoint(server, "/oauth/authorize"))
		.access_token_endpoint(endpoint(server, "/oauth/access_token"))
		.build()
		.expect("Consumer descriptor should build successfully.");

	mock_session(consumer)
}

async fn mock_request_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/oauth/request_token")
				.query_param("oauth_consumer_key", CONSUMER_KEY)
				.query_param("oauth_signature_method", "HMAC-SHA1")
				.query_param_exists("oauth_signature");
			then.status(200).body("oauth_token_secret=req-secret&oauth_token=req-token");
		})
		.await
}

#[tokio::test]
async fn request_token_is_fetched_once_and_memoized() {
	let server = MockServer::start_async().await;
	let session = build_session(&server);
	let mock = mock_request_token(&server).await;

	assert_eq!(session.token_state(), TokenState::Unauthenticated);

	let first =
		session.obtain_request_token().await.expect("Initial request token fetch should succeed.");
	let second =
		session.obtain_request_token().await.expect("Memoized request token should be returned.");

	assert_eq!(first.token, "req-token");
	assert_eq!(first.secret.expose(), "req-secret");
	assert_eq!(first, second);
	assert_eq!(session.token_state(), TokenState::RequestTokenIssued);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_first_fetches_share_one_round_trip() {
	let server = MockServer::start_async().await;
	let session = build_session(&server);
	let mock = mock_request_token(&server).await;
	let (first, second) =
		tokio::join!(session.obtain_request_token(), session.obtain_request_token());

	assert_eq!(first.expect("First concurrent fetch should succeed.").token, "req-token");
	assert_eq!(second.expect("Second concurrent fetch should succeed.").token, "req-token");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn start_authorization_builds_the_user_url() {
	let server = MockServer::start_async().await;
	let session = build_session(&server);
	let _mock = mock_request_token(&server).await;
	let err = session.authorization_url().expect_err("No request token is cached yet.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRequestToken)));

	let url = session.start_authorization().await.expect("Authorization should start.");

	assert_eq!(url.as_str(), format!("{}?oauth_token=req-token", server.url("/oauth/authorize")));
	assert_eq!(
		session.authorization_url().expect("Cached request token should build the URL."),
		url
	);
}

#[tokio::test]
async fn access_token_is_signed_with_the_request_token() {
	let server = MockServer::start_async().await;
	let session = build_session(&server);
	let request_mock = mock_request_token(&server).await;
	let access_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/oauth/access_token")
				.query_param("oauth_token", "req-token")
				.query_param_exists("oauth_signature");
			then.status(200).body("oauth_token=acc-token&oauth_token_secret=acc-secret&uid=42");
		})
		.await;
	let access =
		session.obtain_access_token().await.expect("Access token exchange should succeed.");
	let again = session.obtain_access_token().await.expect("Memoized access token should return.");

	assert_eq!(access.token, "acc-token");
	assert_eq!(access.secret.expose(), "acc-secret");
	assert_eq!(again, access);
	assert_eq!(session.token_state(), TokenState::AccessTokenIssued);
	assert_eq!(session.tokens().active_credential(), Some(access));

	request_mock.assert_calls_async(1).await;
	access_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn verifier_is_forwarded_to_the_access_token_endpoint() {
	let server = MockServer::start_async().await;
	let session = build_session(&server);
	let _request_mock = mock_request_token(&server).await;
	let access_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/oauth/access_token")
				.query_param("oauth_token", "req-token")
				.query_param("oauth_verifier", "verifier-123");
			then.status(200).body("oauth_token=acc-token&oauth_token_secret=acc-secret");
		})
		.await;
	let access = session
		.obtain_access_token_with_verifier("verifier-123")
		.await
		.expect("Verified access token exchange should succeed.");

	assert_eq!(access.token, "acc-token");

	access_mock.assert_async().await;
}

#[tokio::test]
async fn missing_endpoints_fail_before_any_network_call() {
	let consumer = Consumer::builder(CONSUMER_KEY, CONSUMER_SECRET)
		.build()
		.expect("Consumer descriptor without endpoints should build.");
	let session = mock_session(consumer);
	let err = session.obtain_request_token().await.expect_err("Request token endpoint is missing.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::MissingEndpoint { endpoint: "request_token" })
	));

	let err = session.obtain_access_token().await.expect_err("Access token endpoint is missing.");

	assert!(matches!(err, Error::Config(ConfigError::MissingEndpoint { endpoint: "access_token" })));

	let err = session.start_authorization().await.expect_err("Authorization endpoint is missing.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::MissingEndpoint { endpoint: "authorization" })
	));
	assert_eq!(session.token_state(), TokenState::Unauthenticated);
}

#[tokio::test]
async fn failed_fetches_are_not_cached() {
	let server = MockServer::start_async().await;
	let session = build_session(&server);
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/request_token");
			then.status(401).body("{\"error\": \"Unauthorized\"}");
		})
		.await;
	let err = session.obtain_request_token().await.expect_err("Rejected fetch should fail.");

	match err {
		Error::Transport(TransportError::Status { status, body, .. }) => {
			assert_eq!(status, 401);
			assert_eq!(body, "{\"error\": \"Unauthorized\"}");
		},
		other => panic!("Unexpected error: {other:?}"),
	}
	assert_eq!(session.token_state(), TokenState::Unauthenticated);

	rejected.delete_async().await;

	let accepted = mock_request_token(&server).await;
	let credential =
		session.obtain_request_token().await.expect("Second fetch attempt should succeed.");

	assert_eq!(credential.token, "req-token");

	accepted.assert_calls_async(1).await;
}

#[tokio::test]
async fn malformed_token_bodies_are_protocol_errors() {
	let server = MockServer::start_async().await;
	let session = build_session(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/request_token");
			then.status(200).body("oauth_token=req-token");
		})
		.await;
	let err = session.obtain_request_token().await.expect_err("Secret-less body should fail.");

	assert!(matches!(
		err,
		Error::Protocol(ProtocolError::MissingField { field: "oauth_token_secret" })
	));
	assert!(!err.retryable());
}

#[tokio::test]
async fn restored_access_tokens_skip_the_handshake() {
	let server = MockServer::start_async().await;
	let session =
		build_session(&server).with_access_token(Credential::new("restored", "restored-secret"));
	let access =
		session.obtain_access_token().await.expect("Restored access token should be returned.");

	assert_eq!(access.token, "restored");
	assert_eq!(session.token_state(), TokenState::AccessTokenIssued);
}
