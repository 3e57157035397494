//! Successful response handles returned by the dispatcher.

// crates.io
use ::http::{HeaderMap, StatusCode, header::CONTENT_LENGTH};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ProtocolError, TransportError},
	http::ResponseBody,
};

/// Open 2xx response positioned at the start of its body.
///
/// The underlying connection is released when the stream is dropped, including on early
/// returns from the caller's error paths.
#[derive(Debug)]
pub struct ResponseStream {
	status: StatusCode,
	headers: HeaderMap,
	body: ResponseBody,
}
impl ResponseStream {
	pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
		Self { status, headers, body }
	}

	/// HTTP status of the response.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Declared `Content-Length`, if the server sent one.
	pub fn content_length(&self) -> Option<u64> {
		self.headers.get(CONTENT_LENGTH)?.to_str().ok()?.parse().ok()
	}

	/// Reads the next body chunk; `None` marks the end of the body.
	pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
		Ok(self.body.next_chunk().await.map_err(TransportError::from)?)
	}

	/// Drains the body.
	pub async fn bytes(self) -> Result<Vec<u8>> {
		Ok(self.body.collect().await.map_err(TransportError::from)?)
	}

	/// Drains the body as UTF-8 text.
	pub async fn text(self) -> Result<String> {
		let bytes = self.bytes().await?;

		Ok(String::from_utf8(bytes).map_err(ProtocolError::InvalidUtf8)?)
	}

	/// Drains the body and parses it as a generic JSON tree.
	pub async fn json(self) -> Result<Value> {
		let bytes = self.bytes().await?;

		Ok(serde_json::from_slice(&bytes).map_err(ProtocolError::InvalidJson)?)
	}
}

/// Decodes a generic JSON tree into a typed record, reporting the failing path on mismatch.
pub fn decode_json<T>(value: Value) -> Result<T, ProtocolError>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(ProtocolError::Decode)
}
