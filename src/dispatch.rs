//! Signed request dispatcher.
//!
//! [`Dispatcher`] signs every call with a fresh [`OAuthStamp`], performs exactly one HTTP
//! exchange through the configured [`HttpTransport`], and hands the response back as text, a
//! JSON tree, or an open [`ResponseStream`]. Any non-2xx status becomes
//! [`TransportError::Status`] carrying the raw body; nothing is retried.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	error::TransportError,
	http::{HttpTransport, RequestOptions, TransportErrorMapper, parse_retry_after},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	signature::{OAuthStamp, SigningContext},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport stack.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Decoded result of [`Dispatcher::execute`], shaped by the request's [`ResponseKind`].
#[derive(Debug)]
pub enum DispatchResult {
	/// Drained UTF-8 body.
	Text(String),
	/// Parsed JSON tree.
	Json(Value),
	/// Open body for the caller to read.
	Stream(ResponseStream),
}

/// Signs and executes API calls for one consumer.
pub struct Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Options applied when a request leaves a field unset.
	pub default_options: RequestOptions,
	consumer_key: String,
	consumer_secret: TokenSecret,
}
impl<C, M> Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a dispatcher signing with the provided consumer key material.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: TokenSecret,
		http_client: impl Into<Arc<C>>,
		transport_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: transport_mapper.into(),
			default_options: RequestOptions::default(),
			consumer_key: consumer_key.into(),
			consumer_secret,
		}
	}

	/// Consumer key used in `oauth_consumer_key`.
	pub fn consumer_key(&self) -> &str {
		&self.consumer_key
	}

	/// Executes `request`, decoding the response according to `request.kind`.
	///
	/// `credential` is the token to sign with; `None` signs with the consumer secret only.
	pub async fn execute(
		&self,
		credential: Option<&Credential>,
		request: ApiRequest,
	) -> Result<DispatchResult> {
		match request.kind {
			ResponseKind::Text => self.text(credential, request).await.map(DispatchResult::Text),
			ResponseKind::Json => self.json(credential, request).await.map(DispatchResult::Json),
			ResponseKind::Stream =>
				self.stream(credential, request).await.map(DispatchResult::Stream),
		}
	}

	/// Executes `request` and drains the body as text.
	pub async fn text(&self, credential: Option<&Credential>, request: ApiRequest) -> Result<String> {
		self.observed("text", async { self.send(credential, &request).await?.text().await }).await
	}

	/// Executes `request` and parses the body as JSON.
	pub async fn json(&self, credential: Option<&Credential>, request: ApiRequest) -> Result<Value> {
		self.observed("json", async { self.send(credential, &request).await?.json().await }).await
	}

	/// Executes `request` and returns the open body.
	pub async fn stream(
		&self,
		credential: Option<&Credential>,
		request: ApiRequest,
	) -> Result<ResponseStream> {
		self.observed("stream", self.send(credential, &request)).await
	}

	async fn observed<T, F>(&self, stage: &'static str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		const KIND: OperationKind = OperationKind::Dispatch;

		let span = OperationSpan::new(KIND, stage);

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span.instrument(fut).await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	async fn send(
		&self,
		credential: Option<&Credential>,
		request: &ApiRequest,
	) -> Result<ResponseStream> {
		let stamp = OAuthStamp::generate();
		let ctx = SigningContext {
			consumer_key: &self.consumer_key,
			consumer_secret: self.consumer_secret.expose(),
			token: credential,
			stamp: &stamp,
		};
		let (_, http_request) = request.sign(&ctx)?;
		let options = request.options.or(self.default_options);
		let response = self
			.http_client
			.execute(http_request, &options)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(err))?;
		let (parts, body) = response.into_parts();

		if !parts.status.is_success() {
			// The status is what matters; a body that fails mid-read is reported empty.
			let raw = body.collect().await.unwrap_or_default();

			return Err(TransportError::Status {
				status: parts.status.as_u16(),
				body: String::from_utf8_lossy(&raw).into_owned(),
				retry_after: parse_retry_after(&parts.headers),
			}
			.into());
		}

		Ok(ResponseStream::new(parts.status, parts.headers, body))
	}
}
impl<C, M> Debug for Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret_set", &!self.consumer_secret.is_empty())
			.field("default_options", &self.default_options)
			.finish()
	}
}
