//! Two-phase token handshake with memoized credentials.
//!
//! [`TokenLifecycle`] owns the request and access credentials for one session. Each is fetched at
//! most once: the first successful response is cached and returned on every later call, even if
//! the server subsequently rejects it. Callers that need to re-authenticate construct a new
//! session. First fetches are serialized by an async single-flight lock, so concurrent callers
//! share one network round-trip.
//!
//! Token endpoints answer with `application/x-www-form-urlencoded` bodies, not JSON.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenState},
	consumer::OAuthEndpoints,
	dispatch::{ApiRequest, Dispatcher, ResponseKind},
	error::ConfigError,
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	signature::Method,
};

/// Owner of the session's request and access credentials.
#[derive(Debug, Default)]
pub struct TokenLifecycle {
	endpoints: OAuthEndpoints,
	request_token: RwLock<Option<Credential>>,
	access_token: RwLock<Option<Credential>>,
	fetch_guard: AsyncMutex<()>,
}
impl TokenLifecycle {
	/// Creates an unauthenticated lifecycle for the provided endpoints.
	pub fn new(endpoints: OAuthEndpoints) -> Self {
		Self { endpoints, ..Default::default() }
	}

	/// Seeds the lifecycle with an access token obtained in an earlier session.
	pub fn with_access_token(self, credential: Credential) -> Self {
		*self.access_token.write() = Some(credential);

		self
	}

	/// Configured endpoints.
	pub fn endpoints(&self) -> &OAuthEndpoints {
		&self.endpoints
	}

	/// Current phase, inferred from which credentials are cached.
	pub fn state(&self) -> TokenState {
		if self.access_token.read().is_some() {
			TokenState::AccessTokenIssued
		} else if self.request_token.read().is_some() {
			TokenState::RequestTokenIssued
		} else {
			TokenState::Unauthenticated
		}
	}

	/// Cached request token, without touching the network.
	pub fn request_token(&self) -> Option<Credential> {
		self.request_token.read().clone()
	}

	/// Cached access token, without touching the network.
	pub fn access_token(&self) -> Option<Credential> {
		self.access_token.read().clone()
	}

	/// Credential used to sign ordinary calls: access token, else request token, else none.
	pub fn active_credential(&self) -> Option<Credential> {
		self.access_token().or_else(|| self.request_token())
	}

	/// Builds `{authorization}?oauth_token={request token}` from cached state only.
	///
	/// Fails with [`ConfigError::MissingEndpoint`] when no authorization endpoint is configured
	/// and with [`ConfigError::MissingRequestToken`] when no request token has been fetched yet.
	pub fn authorization_url(&self) -> Result<Url, ConfigError> {
		let mut url = self.endpoints.require_authorization()?.clone();
		let request_token = self.request_token().ok_or(ConfigError::MissingRequestToken)?;

		url.query_pairs_mut().append_pair("oauth_token", &request_token.token);

		Ok(url)
	}

	/// Returns the cached request token, fetching it on first use.
	///
	/// The fetch is a GET signed with the consumer secret only.
	pub async fn obtain_request_token<C, M>(
		&self,
		dispatcher: &Dispatcher<C, M>,
	) -> Result<Credential>
	where
		C: ?Sized + HttpTransport,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		const KIND: OperationKind = OperationKind::RequestToken;

		let url = self.endpoints.require_request_token()?.clone();

		if let Some(cached) = self.request_token() {
			obs::record_token_cache_hit(KIND);

			return Ok(cached);
		}

		let span = OperationSpan::new(KIND, "obtain_request_token");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.fetch_guard.lock().await;

				if let Some(cached) = self.request_token() {
					return Ok(cached);
				}

				let credential = fetch_credential(dispatcher, None, url, None).await?;

				*self.request_token.write() = Some(credential.clone());

				Ok(credential)
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	/// Fetches the request token if needed and returns the URL the user must visit.
	pub async fn start_authorization<C, M>(&self, dispatcher: &Dispatcher<C, M>) -> Result<Url>
	where
		C: ?Sized + HttpTransport,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		// Fail on a missing authorization endpoint before spending a round-trip.
		self.endpoints.require_authorization()?;
		self.obtain_request_token(dispatcher).await?;

		Ok(self.authorization_url()?)
	}

	/// Returns the cached access token, exchanging the request token on first use.
	///
	/// A missing request token is fetched implicitly first.
	pub async fn obtain_access_token<C, M>(&self, dispatcher: &Dispatcher<C, M>) -> Result<Credential>
	where
		C: ?Sized + HttpTransport,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		self.exchange_access_token(dispatcher, None).await
	}

	/// Same as [`obtain_access_token`](Self::obtain_access_token), additionally sending the
	/// `oauth_verifier` issued on the authorization callback.
	pub async fn obtain_access_token_with_verifier<C, M>(
		&self,
		dispatcher: &Dispatcher<C, M>,
		verifier: &str,
	) -> Result<Credential>
	where
		C: ?Sized + HttpTransport,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		self.exchange_access_token(dispatcher, Some(verifier)).await
	}

	async fn exchange_access_token<C, M>(
		&self,
		dispatcher: &Dispatcher<C, M>,
		verifier: Option<&str>,
	) -> Result<Credential>
	where
		C: ?Sized + HttpTransport,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		const KIND: OperationKind = OperationKind::AccessToken;

		let url = self.endpoints.require_access_token()?.clone();

		if let Some(cached) = self.access_token() {
			obs::record_token_cache_hit(KIND);

			return Ok(cached);
		}

		let request_token = self.obtain_request_token(dispatcher).await?;
		let span = OperationSpan::new(KIND, "obtain_access_token");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.fetch_guard.lock().await;

				if let Some(cached) = self.access_token() {
					return Ok(cached);
				}

				let credential =
					fetch_credential(dispatcher, Some(&request_token), url, verifier).await?;

				*self.access_token.write() = Some(credential.clone());

				Ok(credential)
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}
}

async fn fetch_credential<C, M>(
	dispatcher: &Dispatcher<C, M>,
	signing_token: Option<&Credential>,
	url: Url,
	verifier: Option<&str>,
) -> Result<Credential>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut request = ApiRequest::new(Method::Get, url).kind(ResponseKind::Text);

	if let Some(verifier) = verifier {
		request = request.param("oauth_verifier", verifier);
	}

	let body = dispatcher.text(signing_token, request).await?;

	Ok(Credential::from_form_body(&body)?)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoints() -> OAuthEndpoints {
		OAuthEndpoints {
			request_token: None,
			authorization: Some(
				Url::parse("https://www.example.com/1/oauth/authorize")
					.expect("Failed to parse authorization endpoint URL."),
			),
			access_token: None,
		}
	}

	#[test]
	fn state_follows_cached_credentials() {
		let lifecycle = TokenLifecycle::new(endpoints());

		assert_eq!(lifecycle.state(), TokenState::Unauthenticated);
		assert!(lifecycle.active_credential().is_none());

		*lifecycle.request_token.write() = Some(Credential::new("req", "req-secret"));

		assert_eq!(lifecycle.state(), TokenState::RequestTokenIssued);
		assert_eq!(lifecycle.active_credential().map(|c| c.token), Some("req".into()));

		let lifecycle = lifecycle.with_access_token(Credential::new("acc", "acc-secret"));

		assert_eq!(lifecycle.state(), TokenState::AccessTokenIssued);
		assert_eq!(lifecycle.active_credential().map(|c| c.token), Some("acc".into()));
	}

	#[test]
	fn authorization_url_is_a_pure_accessor() {
		let lifecycle = TokenLifecycle::new(endpoints());
		let err = lifecycle.authorization_url().expect_err("No request token is cached yet.");

		assert!(matches!(err, ConfigError::MissingRequestToken));

		*lifecycle.request_token.write() = Some(Credential::new("req-token", "req-secret"));

		let url = lifecycle.authorization_url().expect("Cached request token should build a URL.");

		assert_eq!(url.as_str(), "https://www.example.com/1/oauth/authorize?oauth_token=req-token");
	}

	#[test]
	fn authorization_url_requires_endpoint() {
		let lifecycle = TokenLifecycle::new(OAuthEndpoints::default());

		*lifecycle.request_token.write() = Some(Credential::new("req-token", "req-secret"));

		let err = lifecycle.authorization_url().expect_err("Endpoint is not configured.");

		assert!(matches!(err, ConfigError::MissingEndpoint { endpoint: "authorization" }));
	}
}
