//! Authenticated session facade composing the token lifecycle with the request dispatcher.

// std
use std::io::Read;
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenState},
	consumer::Consumer,
	dispatch::{ApiRequest, DispatchResult, Dispatcher, ResponseStream},
	http::{HttpTransport, RequestOptions, TransportErrorMapper},
	token::TokenLifecycle,
	upload::ChunkedUploader,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Session specialized for the crate's default reqwest transport stack.
pub type ReqwestSession = Session<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// One consumer's authenticated conversation with a provider.
///
/// The session owns the memoized request/access credentials and signs every call with the most
/// advanced one available. Sessions are `Send + Sync` and may be shared behind `Arc`; concurrent
/// first token fetches collapse into a single network call.
pub struct Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Signing dispatcher shared by every call issued through this session.
	pub dispatcher: Dispatcher<C, M>,
	tokens: TokenLifecycle,
}
impl<C, M> Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a session that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		consumer: Consumer,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let Consumer { key, secret, endpoints } = consumer;

		Self {
			dispatcher: Dispatcher::new(key, secret, http_client, mapper),
			tokens: TokenLifecycle::new(endpoints),
		}
	}

	/// Restores an access token issued in an earlier session, skipping the handshake.
	pub fn with_access_token(mut self, credential: Credential) -> Self {
		self.tokens = self.tokens.with_access_token(credential);

		self
	}

	/// Sets the timeout applied to calls that do not specify their own.
	pub fn with_default_timeout(mut self, timeout: StdDuration) -> Self {
		self.dispatcher.default_options = RequestOptions::with_timeout(timeout);

		self
	}

	/// Token lifecycle owned by this session.
	pub fn tokens(&self) -> &TokenLifecycle {
		&self.tokens
	}

	/// Current handshake phase.
	pub fn token_state(&self) -> TokenState {
		self.tokens.state()
	}

	/// See [`TokenLifecycle::obtain_request_token`].
	pub async fn obtain_request_token(&self) -> Result<Credential> {
		self.tokens.obtain_request_token(&self.dispatcher).await
	}

	/// See [`TokenLifecycle::authorization_url`].
	pub fn authorization_url(&self) -> Result<Url> {
		Ok(self.tokens.authorization_url()?)
	}

	/// See [`TokenLifecycle::start_authorization`].
	pub async fn start_authorization(&self) -> Result<Url> {
		self.tokens.start_authorization(&self.dispatcher).await
	}

	/// See [`TokenLifecycle::obtain_access_token`].
	pub async fn obtain_access_token(&self) -> Result<Credential> {
		self.tokens.obtain_access_token(&self.dispatcher).await
	}

	/// See [`TokenLifecycle::obtain_access_token_with_verifier`].
	pub async fn obtain_access_token_with_verifier(&self, verifier: &str) -> Result<Credential> {
		self.tokens.obtain_access_token_with_verifier(&self.dispatcher, verifier).await
	}

	/// Signs `request` with the active credential and decodes the response per `request.kind`.
	pub async fn execute(&self, request: ApiRequest) -> Result<DispatchResult> {
		let credential = self.tokens.active_credential();

		self.dispatcher.execute(credential.as_ref(), request).await
	}

	/// Signs `request` with the active credential and returns the body as text.
	pub async fn text(&self, request: ApiRequest) -> Result<String> {
		let credential = self.tokens.active_credential();

		self.dispatcher.text(credential.as_ref(), request).await
	}

	/// Signs `request` with the active credential and returns the parsed JSON tree.
	pub async fn json(&self, request: ApiRequest) -> Result<Value> {
		let credential = self.tokens.active_credential();

		self.dispatcher.json(credential.as_ref(), request).await
	}

	/// Signs `request` with the active credential and returns the open body.
	pub async fn stream(&self, request: ApiRequest) -> Result<ResponseStream> {
		let credential = self.tokens.active_credential();

		self.dispatcher.stream(credential.as_ref(), request).await
	}

	/// Creates a fresh chunked uploader pushing `total_size` bytes of `source` to `endpoint`.
	pub fn chunked_uploader<R>(
		&self,
		endpoint: Url,
		source: R,
		total_size: u64,
	) -> ChunkedUploader<'_, C, M, R>
	where
		R: Read,
	{
		ChunkedUploader::new(self, endpoint, source, total_size)
	}
}
#[cfg(feature = "reqwest")]
impl Session<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a session for `consumer` backed by a default reqwest transport.
	pub fn new(consumer: Consumer) -> Self {
		Self::with_http_client(
			consumer,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("dispatcher", &self.dispatcher)
			.field("endpoints", self.tokens.endpoints())
			.field("token_state", &self.tokens.state())
			.finish()
	}
}
