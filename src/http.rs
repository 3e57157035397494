//! Transport primitives for signed API calls.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. It receives a fully signed
//! [`HttpRequest`] and hands back the status, headers, and an incrementally readable
//! [`ResponseBody`], so streaming downloads never have to be buffered by the transport.
//! [`TransportErrorMapper`] turns the transport's native error type into the crate [`Error`].

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use ::http::{HeaderMap, header::RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};

/// Fully signed request handed to a transport.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Response head plus a streaming body.
pub type HttpResponse = ::http::Response<ResponseBody>;
/// Future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;
/// Future returned by [`BodySource::next_chunk`].
pub type BodyFuture<'a> =
	Pin<Box<dyn Future<Output = std::io::Result<Option<Bytes>>> + 'a + Send>>;

/// Per-call transport options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// Upper bound for the whole exchange; `None` leaves it to the transport.
	pub timeout: Option<StdDuration>,
}
impl RequestOptions {
	/// Options with the provided timeout.
	pub fn with_timeout(timeout: StdDuration) -> Self {
		Self { timeout: Some(timeout) }
	}

	/// Fills unset fields from `defaults`.
	pub fn or(self, defaults: RequestOptions) -> Self {
		Self { timeout: self.timeout.or(defaults.timeout) }
	}
}

/// Abstraction over HTTP transports capable of executing signed API calls.
///
/// Implementations must be `Send + Sync + 'static` so a session can share them behind `Arc`,
/// and the futures they return must be `Send`. Non-2xx statuses are not errors at this layer;
/// return them as ordinary responses and let the dispatcher classify them.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Performs one HTTP exchange.
	fn execute(
		&self,
		request: HttpRequest,
		options: &RequestOptions,
	) -> TransportFuture<'_, Self::TransportError>;
}

/// Maps transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport into a crate error.
	fn map_transport_error(&self, error: E) -> Error;
}

/// Incremental reader behind a [`ResponseBody`].
pub trait BodySource
where
	Self: Send,
{
	/// Returns the next chunk, or `None` once the body is exhausted.
	fn next_chunk(&mut self) -> BodyFuture<'_>;
}

/// Response body that can be drained chunk by chunk. Dropping it releases the connection.
pub struct ResponseBody(Box<dyn BodySource>);
impl ResponseBody {
	/// Wraps a streaming source.
	pub fn from_source(source: impl 'static + BodySource) -> Self {
		Self(Box::new(source))
	}

	/// Body already held in memory.
	pub fn full(bytes: impl Into<Bytes>) -> Self {
		Self::from_source(FullBody(Some(bytes.into())))
	}

	/// Body without content.
	pub fn empty() -> Self {
		Self::from_source(FullBody(None))
	}

	/// Returns the next chunk, or `None` once the body is exhausted.
	pub async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
		self.0.next_chunk().await
	}

	/// Drains the remaining body into memory.
	pub async fn collect(mut self) -> std::io::Result<Vec<u8>> {
		let mut buf = Vec::new();

		while let Some(chunk) = self.next_chunk().await? {
			buf.extend_from_slice(&chunk);
		}

		Ok(buf)
	}
}
impl Debug for ResponseBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ResponseBody(..)")
	}
}

struct FullBody(Option<Bytes>);
impl BodySource for FullBody {
	fn next_chunk(&mut self) -> BodyFuture<'_> {
		let chunk = self.0.take().filter(|bytes| !bytes.is_empty());

		Box::pin(async move { Ok(chunk) })
	}
}

/// Parses a `Retry-After` header expressed either in seconds or as an RFC 2822 date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(
		&self,
		request: HttpRequest,
		options: &RequestOptions,
	) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();
		let timeout = options.timeout;

		Box::pin(async move {
			let mut request = reqwest::Request::try_from(request)?;

			if let Some(timeout) = timeout {
				*request.timeout_mut() = Some(timeout);
			}

			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut mapped = HttpResponse::new(ResponseBody::from_source(ReqwestBody(response)));

			*mapped.status_mut() = status;
			*mapped.headers_mut() = headers;

			Ok(mapped)
		})
	}
}

#[cfg(feature = "reqwest")]
struct ReqwestBody(reqwest::Response);
#[cfg(feature = "reqwest")]
impl BodySource for ReqwestBody {
	fn next_chunk(&mut self) -> BodyFuture<'_> {
		Box::pin(async move { self.0.chunk().await.map_err(std::io::Error::other) })
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: ReqwestError) -> Error {
		if err.is_builder() {
			return ConfigError::from(err).into();
		}

		let retryable = err.is_timeout() || err.is_connect();

		TransportError::network(err, retryable).into()
	}
}
